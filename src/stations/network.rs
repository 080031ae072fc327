//! Station topology and stations-travelled distances.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use tracing::info;

use super::StationDistance;
use crate::error::{ConfigurationError, LookupError};

/// Stations of a single line in physical order.
#[derive(Debug, Clone)]
pub struct StationOrdering {
    stations: Vec<String>,
    index: HashMap<String, usize>,
}

impl StationOrdering {
    pub fn new<S: Into<String>>(
        line: &str,
        stations: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigurationError> {
        let stations: Vec<String> = stations.into_iter().map(Into::into).collect();
        if stations.is_empty() {
            return Err(ConfigurationError::EmptyLine(line.to_string()));
        }

        let mut index = HashMap::with_capacity(stations.len());
        for (i, station) in stations.iter().enumerate() {
            if index.insert(station.clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateStation {
                    line: line.to_string(),
                    station: station.clone(),
                });
            }
        }

        Ok(Self { stations, index })
    }

    pub fn index_of(&self, station: &str) -> Option<usize> {
        self.index.get(station).copied()
    }

    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl StationDistance for StationOrdering {
    fn stations_travelled(&self, origin: &str, destination: &str) -> Result<u32, LookupError> {
        let from = self
            .index_of(origin)
            .ok_or_else(|| LookupError::UnknownStation(origin.to_string()))?;
        let to = self
            .index_of(destination)
            .ok_or_else(|| LookupError::UnknownStation(destination.to_string()))?;
        Ok(from.abs_diff(to) as u32)
    }

    fn diameter(&self) -> Option<u32> {
        Some(self.stations.len().saturating_sub(1) as u32)
    }
}

/// Lines joined at interchanges.
///
/// A station appearing on more than one line is a single node shared by
/// those lines. Distances are shortest hop counts over consecutive stations
/// of each line, computed once for every pair at construction.
#[derive(Debug, Clone)]
pub struct StationNetwork {
    lines: Vec<(String, StationOrdering)>,
    ids: HashMap<String, usize>,
    hops: Vec<Option<u32>>,
}

impl StationNetwork {
    pub fn from_lines(
        lines: impl IntoIterator<Item = (String, StationOrdering)>,
    ) -> Result<Self, ConfigurationError> {
        let lines: Vec<_> = lines.into_iter().collect();
        if lines.is_empty() {
            return Err(ConfigurationError::EmptyNetwork);
        }

        let mut ids: HashMap<String, usize> = HashMap::new();
        for (_, ordering) in &lines {
            for station in ordering.stations() {
                let next = ids.len();
                ids.entry(station.clone()).or_insert(next);
            }
        }

        let n = ids.len();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (_, ordering) in &lines {
            for pair in ordering.stations().windows(2) {
                let a = ids[&pair[0]];
                let b = ids[&pair[1]];
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }

        let mut hops = vec![None; n * n];
        let mut queue = VecDeque::new();
        for source in 0..n {
            let row = &mut hops[source * n..(source + 1) * n];
            row[source] = Some(0);
            queue.push_back(source);
            while let Some(node) = queue.pop_front() {
                let Some(depth) = row[node] else { continue };
                for &next in &adjacency[node] {
                    if row[next].is_none() {
                        row[next] = Some(depth + 1);
                        queue.push_back(next);
                    }
                }
            }
        }

        Ok(Self { lines, ids, hops })
    }

    pub fn single_line(line: &str, ordering: StationOrdering) -> Self {
        let n = ordering.len();
        let ids = ordering
            .stations()
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let hops = (0..n * n)
            .map(|k| Some((k / n).abs_diff(k % n) as u32))
            .collect();
        Self {
            lines: vec![(line.to_string(), ordering)],
            ids,
            hops,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = (&str, &StationOrdering)> {
        self.lines.iter().map(|(name, ordering)| (name.as_str(), ordering))
    }

    pub fn station_count(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, station: &str) -> bool {
        self.ids.contains_key(station)
    }

    /// Stations that belong to more than one line.
    pub fn interchanges(&self) -> Vec<&str> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (_, ordering) in &self.lines {
            for station in ordering.stations() {
                *seen.entry(station.as_str()).or_default() += 1;
            }
        }
        let mut shared: Vec<&str> = seen
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(station, _)| station)
            .collect();
        shared.sort_unstable();
        shared
    }
}

impl StationDistance for StationNetwork {
    fn stations_travelled(&self, origin: &str, destination: &str) -> Result<u32, LookupError> {
        let from = *self
            .ids
            .get(origin)
            .ok_or_else(|| LookupError::UnknownStation(origin.to_string()))?;
        let to = *self
            .ids
            .get(destination)
            .ok_or_else(|| LookupError::UnknownStation(destination.to_string()))?;

        self.hops[from * self.ids.len() + to].ok_or_else(|| LookupError::Unreachable {
            origin: origin.to_string(),
            destination: destination.to_string(),
        })
    }

    fn diameter(&self) -> Option<u32> {
        self.hops.iter().flatten().copied().max()
    }
}

#[derive(Debug, Deserialize)]
struct LineRow {
    line: String,
    sequence: u32,
    station: String,
}

/// Loads a network from a semicolon-separated `line;sequence;station` file.
///
/// Rows may appear in any order; each line's stations are ordered by
/// `sequence`. Repeating a sequence number within a line is an error.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_station_lines(path: impl AsRef<Path>) -> Result<StationNetwork> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening station lines {}", path.display()))?;

    let mut lines: BTreeMap<String, BTreeMap<u32, String>> = BTreeMap::new();
    for result in reader.deserialize() {
        let row: LineRow = result.with_context(|| format!("reading {}", path.display()))?;
        let stations = lines.entry(row.line.clone()).or_default();
        if stations.insert(row.sequence, row.station).is_some() {
            anyhow::bail!(
                "{}: line {:?} repeats sequence {}",
                path.display(),
                row.line,
                row.sequence
            );
        }
    }

    let orderings = lines
        .into_iter()
        .map(|(line, stations)| {
            StationOrdering::new(&line, stations.into_values()).map(|ordering| (line, ordering))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let network = StationNetwork::from_lines(orderings)?;
    info!(
        lines = network.lines.len(),
        stations = network.station_count(),
        interchanges = network.interchanges().len(),
        "Loaded station network"
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn line(name: &str, stations: &[&str]) -> (String, StationOrdering) {
        (
            name.to_string(),
            StationOrdering::new(name, stations.iter().copied()).unwrap(),
        )
    }

    #[test]
    fn test_ordering_distance_is_index_difference() {
        let ordering = StationOrdering::new("main", ["A", "B", "C", "D", "E"]).unwrap();
        assert_eq!(ordering.stations_travelled("A", "C").unwrap(), 2);
        assert_eq!(ordering.stations_travelled("E", "A").unwrap(), 4);
        assert_eq!(ordering.stations_travelled("B", "C").unwrap(), 1);
        assert_eq!(ordering.stations_travelled("D", "D").unwrap(), 0);
        assert_eq!(ordering.diameter(), Some(4));
    }

    #[test]
    fn test_ordering_rejects_duplicates_and_empty() {
        assert_eq!(
            StationOrdering::new("main", ["A", "B", "A"]).unwrap_err(),
            ConfigurationError::DuplicateStation {
                line: "main".into(),
                station: "A".into()
            }
        );
        assert_eq!(
            StationOrdering::new("main", Vec::<&str>::new()).unwrap_err(),
            ConfigurationError::EmptyLine("main".into())
        );
    }

    #[test]
    fn test_unknown_station() {
        let ordering = StationOrdering::new("main", ["A", "B"]).unwrap();
        assert_eq!(
            ordering.stations_travelled("A", "Z").unwrap_err(),
            LookupError::UnknownStation("Z".into())
        );
    }

    #[test]
    fn test_single_line_network_matches_ordering() {
        let ordering = StationOrdering::new("main", ["A", "B", "C", "D", "E"]).unwrap();
        let network = StationNetwork::single_line("main", ordering.clone());
        let linked = StationNetwork::from_lines([line("main", &["A", "B", "C", "D", "E"])]).unwrap();

        for a in ordering.stations() {
            for b in ordering.stations() {
                let expected = ordering.stations_travelled(a, b).unwrap();
                assert_eq!(network.stations_travelled(a, b).unwrap(), expected);
                assert_eq!(linked.stations_travelled(a, b).unwrap(), expected);
            }
        }
        assert_eq!(network.diameter(), Some(4));
    }

    #[test]
    fn test_cross_line_distance_goes_through_interchange() {
        // Purple: P1 - P2 - X - P3 ; Green: G1 - X - G2 - G3
        let network = StationNetwork::from_lines([
            line("purple", &["P1", "P2", "X", "P3"]),
            line("green", &["G1", "X", "G2", "G3"]),
        ])
        .unwrap();

        assert_eq!(network.station_count(), 7);
        assert_eq!(network.interchanges(), vec!["X"]);
        assert_eq!(network.stations_travelled("P1", "G3").unwrap(), 4);
        assert_eq!(network.stations_travelled("G1", "P3").unwrap(), 2);
        assert_eq!(network.stations_travelled("P2", "G1").unwrap(), 2);
        assert_eq!(network.diameter(), Some(4));
    }

    #[test]
    fn test_parallel_lines_take_shorter_path() {
        let network = StationNetwork::from_lines([
            line("slow", &["A", "B", "C", "D", "E"]),
            line("express", &["A", "E"]),
        ])
        .unwrap();

        assert_eq!(network.stations_travelled("A", "E").unwrap(), 1);
        assert_eq!(network.stations_travelled("B", "E").unwrap(), 2);
    }

    #[test]
    fn test_disconnected_lines_are_unreachable() {
        let network =
            StationNetwork::from_lines([line("one", &["A", "B"]), line("two", &["C", "D"])]).unwrap();

        assert_eq!(
            network.stations_travelled("A", "D").unwrap_err(),
            LookupError::Unreachable {
                origin: "A".into(),
                destination: "D".into()
            }
        );
    }

    #[test]
    fn test_empty_network_is_error() {
        let lines: Vec<(String, StationOrdering)> = Vec::new();
        assert_eq!(
            StationNetwork::from_lines(lines).unwrap_err(),
            ConfigurationError::EmptyNetwork
        );
    }

    #[test]
    fn test_load_station_lines_orders_by_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station-lines.csv");
        fs::write(
            &path,
            "line;sequence;station\npurple;3;C\npurple;1;A\npurple;2;B\ngreen;1;B\ngreen;2;G\n",
        )
        .unwrap();

        let network = load_station_lines(&path).unwrap();

        assert_eq!(network.station_count(), 4);
        assert_eq!(network.stations_travelled("A", "C").unwrap(), 2);
        assert_eq!(network.stations_travelled("A", "G").unwrap(), 2);
    }

    #[test]
    fn test_load_station_lines_rejects_repeated_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station-lines.csv");
        fs::write(&path, "line;sequence;station\npurple;1;A\npurple;1;B\n").unwrap();

        assert!(load_station_lines(&path).is_err());
    }
}
