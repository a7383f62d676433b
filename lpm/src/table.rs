//! Two-family route table: build, persist, fast-start and lookup.

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use lpm_trie::{key, persist, DynamicTrie, Family, Insert, Label, StaticTrie};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::mapping::{self, LoadReport, Route};

/// Build-time table: one dynamic trie per family.
#[derive(Debug, Default)]
pub struct TableBuilder {
    v4: DynamicTrie,
    v6: DynamicTrie,
}

impl TableBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a mapping file.
    pub fn from_mapping(path: &Path) -> Result<(Self, LoadReport)> {
        let mut builder = Self::new();
        let report = mapping::load(path, &mut builder)?;
        Ok((builder, report))
    }

    /// Insert a parsed route into the trie of its family.
    pub fn insert(&mut self, route: Route) -> Insert {
        let trie = match route.family {
            Family::V4 => &mut self.v4,
            Family::V6 => &mut self.v6,
        };
        trie.insert(&route.key, route.label)
    }

    /// The dynamic trie for `family`.
    pub fn trie(&self, family: Family) -> &DynamicTrie {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }

    /// Distinct labeled prefixes across both families.
    pub fn route_count(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// True when neither family holds a route.
    pub fn is_empty(&self) -> bool {
        self.route_count() == 0
    }

    /// Write both tries to the paths in `config`. Returns records written
    /// per family.
    pub fn persist(&self, config: &Config) -> Result<(usize, usize)> {
        let v4 = persist::save(&self.v4, &config.tree4_path)?;
        let v6 = persist::save(&self.v6, &config.tree6_path)?;
        Ok((v4, v6))
    }

    /// Flatten both tries into a query-ready table.
    pub fn freeze(&self) -> RouteTable {
        RouteTable {
            v4: StaticTrie::from_dynamic(&self.v4),
            v6: StaticTrie::from_dynamic(&self.v6),
        }
    }
}

/// Where an opened table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Parsed from both persisted tries.
    Persisted,
    /// Rebuilt from the mapping file.
    Rebuilt,
}

/// A table returned by [`RouteTable::open`].
#[derive(Debug)]
pub struct Opened {
    /// The query-ready table.
    pub table: RouteTable,
    /// How it was obtained.
    pub source: Source,
    /// Wall time to obtain it.
    pub elapsed: Duration,
    /// Mapping statistics when the table was rebuilt.
    pub load: Option<LoadReport>,
}

/// Result of [`RouteTable::generate`].
#[derive(Debug)]
pub struct Generated {
    /// Mapping statistics.
    pub load: LoadReport,
    /// Records written to the IPv4 trie file.
    pub v4_nodes: usize,
    /// Records written to the IPv6 trie file.
    pub v6_nodes: usize,
    /// Distinct labeled prefixes.
    pub routes: usize,
    /// Wall time for load and serialization.
    pub elapsed: Duration,
}

/// Query-time table: one static trie per family.
#[derive(Debug, Clone)]
pub struct RouteTable {
    v4: StaticTrie,
    v6: StaticTrie,
}

impl RouteTable {
    /// Open the table for `config`.
    ///
    /// Both persisted tries are parsed when present and valid. Otherwise the
    /// table is rebuilt from the mapping file and the persisted tries are
    /// rewritten; a failure to rewrite them is logged, not fatal.
    pub fn open(config: &Config) -> Result<Opened> {
        let started = Instant::now();

        match Self::load_persisted(config) {
            Ok(table) => {
                info!(
                    v4_nodes = table.v4.node_count(),
                    v6_nodes = table.v6.node_count(),
                    "loaded persisted tries"
                );
                return Ok(Opened {
                    table,
                    source: Source::Persisted,
                    elapsed: started.elapsed(),
                    load: None,
                });
            }
            Err(lpm_trie::Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                info!("no persisted tries; building from mapping");
            }
            Err(err) if err.is_corrupt() => {
                warn!(%err, "discarding corrupt persisted trie; rebuilding from mapping");
            }
            Err(err) => {
                warn!(%err, "cannot read persisted trie; rebuilding from mapping");
            }
        }

        let (builder, load) = TableBuilder::from_mapping(&config.mapping_path)?;
        if let Err(err) = builder.persist(config) {
            warn!(%err, "cannot write persisted tries");
        }
        Ok(Opened {
            table: builder.freeze(),
            source: Source::Rebuilt,
            elapsed: started.elapsed(),
            load: Some(load),
        })
    }

    /// Rebuild from the mapping file and persist both tries.
    pub fn generate(config: &Config) -> Result<Generated> {
        let started = Instant::now();
        let (builder, load) = TableBuilder::from_mapping(&config.mapping_path)?;
        let (v4_nodes, v6_nodes) = builder.persist(config)?;
        info!(
            v4_routes = builder.trie(Family::V4).len(),
            v6_routes = builder.trie(Family::V6).len(),
            v4_nodes,
            v6_nodes,
            "generated persisted tries"
        );
        Ok(Generated {
            load,
            v4_nodes,
            v6_nodes,
            routes: builder.route_count(),
            elapsed: started.elapsed(),
        })
    }

    fn load_persisted(config: &Config) -> lpm_trie::Result<Self> {
        Ok(Self {
            v4: persist::load(&config.tree4_path, Family::V4.key_bits())?,
            v6: persist::load(&config.tree6_path, Family::V6.key_bits())?,
        })
    }

    /// Label of the longest prefix containing `address`. Unparsable
    /// addresses have no route.
    pub fn lookup(&self, address: &str) -> Option<Label> {
        let (family, bits) = key::encode_address(address).ok()?;
        self.trie(family).find(&bits)
    }

    /// The static trie for `family`.
    pub fn trie(&self, family: Family) -> &StaticTrie {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }

    /// Distinct labeled prefixes across both families.
    pub fn route_count(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// True when neither family holds a route.
    pub fn is_empty(&self) -> bool {
        self.route_count() == 0
    }
}
