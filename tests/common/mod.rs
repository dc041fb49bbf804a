#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const DICTIONARY: &str = "\
id:
  type: object
name:
  type: object
supertype:
  type: object
subtypes:
  type: object (stored as Python list)
hp:
  type: float64
types:
  type: object (stored as Python list)
legalities:
  type: object (stored as Python dictionary)
releaseDate:
  type: datetime64[ns]
";

pub const INVENTORY: &str = r#"id,name,supertype,subtypes,hp,types,legalities,releaseDate
base1-58,Pikachu,Pokémon,['Basic'],60,['Lightning'],{'unlimited': 'Legal'},1999/01/09
base1-4,Charizard,Pokémon,['Stage 2'],120,['Fire'],{'unlimited': 'Legal'},1999/01/09
xy12-11,Charizard-EX,Pokémon,"['Basic', 'EX']",180,['Fire'],{'expanded': 'Legal'},2016/11/02
sm115-7,Pikachu & Zekrom-GX,Pokémon,"['TAG TEAM', 'GX']",240,['Lightning'],{'expanded': 'Legal'},2018/11/02
base1-81,Energy Removal,Trainer,,,,{'unlimited': 'Legal'},1999/01/09
"#;

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the stock dictionary and inventory, returning their paths.
    pub fn write_card_fixtures(&self) -> (PathBuf, PathBuf) {
        (
            self.write("dictionary.yaml", DICTIONARY),
            self.write("inventory.csv", INVENTORY),
        )
    }
}

/// Coerced copy of the stock inventory.
pub fn card_inventory() -> card_ledger::inventory::Table {
    let workspace = TestWorkspace::new();
    let (dictionary, inventory) = workspace.write_card_fixtures();
    let schema = card_ledger::schema::Schema::load(&dictionary).expect("load dictionary");
    let mut table = card_ledger::inventory::read_table(&inventory, b',', encoding_rs::UTF_8)
        .expect("read inventory");
    card_ledger::coerce::coerce_table(&mut table, &schema);
    table
}
