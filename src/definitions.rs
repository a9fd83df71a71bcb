//! `definition.csv` parsing: region id ↔ colour ↔ name.
//!
//! Format, `;`-separated with a header row:
//!
//! ```text
//! province;red;green;blue;name;x
//! 1;128;34;64;Province_1;x
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::BorderError;
use crate::raster::RegionId;

/// One row of the definition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub id: RegionId,
    pub rgb: [u8; 3],
    pub name: String,
}

/// Lookup tables built from a definition file.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    by_color: HashMap<[u8; 3], RegionId>,
    by_id: BTreeMap<RegionId, Definition>,
}

impl Definitions {
    pub fn load(path: &Path) -> Result<Self, BorderError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, BorderError> {
        let mut defs = Definitions::default();
        let mut first_row = true;
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let row = raw.trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = row.split(';').map(str::trim).collect();
            // Header row: the first data row whose first field is not a number.
            if std::mem::take(&mut first_row) && fields[0].parse::<u32>().is_err() {
                continue;
            }
            let err = |message: String| BorderError::Definitions { line, message };
            if fields.len() < 4 {
                return Err(err(format!("expected at least 4 fields, got {}", fields.len())));
            }
            let id: u16 = fields[0]
                .parse()
                .map_err(|_| err(format!("bad region id '{}'", fields[0])))?;
            let id = RegionId(id);
            if id.is_background() || id > RegionId::MAX {
                return Err(err(format!("region id {id} out of range")));
            }
            let mut rgb = [0u8; 3];
            for (c, field) in rgb.iter_mut().zip(&fields[1..4]) {
                *c = field
                    .parse()
                    .map_err(|_| err(format!("bad colour channel '{field}'")))?;
            }
            let name = fields.get(4).map_or_else(String::new, |s| s.to_string());
            defs.insert(Definition { id, rgb, name })
                .map_err(err)?;
        }
        Ok(defs)
    }

    /// Add a definition; duplicate ids or colours are rejected.
    pub fn insert(&mut self, def: Definition) -> Result<(), String> {
        if self.by_id.contains_key(&def.id) {
            return Err(format!("duplicate region id {}", def.id));
        }
        if let Some(other) = self.by_color.get(&def.rgb) {
            return Err(format!(
                "colour {:?} already used by region {other}",
                def.rgb
            ));
        }
        self.by_color.insert(def.rgb, def.id);
        self.by_id.insert(def.id, def);
        Ok(())
    }

    pub fn region_for_color(&self, rgb: [u8; 3]) -> Option<RegionId> {
        self.by_color.get(&rgb).copied()
    }

    pub fn name_of(&self, id: RegionId) -> Option<&str> {
        self.by_id.get(&id).map(|d| d.name.as_str())
    }

    pub fn get(&self, id: RegionId) -> Option<&Definition> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
