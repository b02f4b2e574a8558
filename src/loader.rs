//! This module provides the `TableLoader` struct, responsible for loading transition
//! tables from files and directories.

use crate::parser::{parse_dual, parse_single};
use crate::table::{DualTable, SingleTable};
use crate::types::TuringMachineError;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of two-tape table files picked up by [`TableLoader::load_dual_dir`].
pub const DUAL_EXTENSION: &str = "tm2";

/// `TableLoader` is a utility struct for loading transition tables from disk.
pub struct TableLoader;

impl TableLoader {
    /// Loads a single-tape table from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(SingleTable)` if the file is read and parses into a valid table.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * Any parse or validation error of [`parse_single`].
    pub fn load_single(path: &Path) -> Result<SingleTable, TuringMachineError> {
        parse_single(&read(path)?)
    }

    /// Loads a two-tape table from the specified file path.
    pub fn load_dual(path: &Path) -> Result<DualTable, TuringMachineError> {
        parse_dual(&read(path)?)
    }

    /// Loads every `.tm2` file in `directory`, sorted by path.
    ///
    /// Subdirectories and files with other extensions are skipped. A file that
    /// fails to load yields an `Err` entry naming it; the others still load.
    pub fn load_dual_dir(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, DualTable), TuringMachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file()
                        && path.extension().is_some_and(|ext| ext == DUAL_EXTENSION)
                    {
                        paths.push(path);
                    }
                }
                Err(e) => results.push(Err(TuringMachineError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }
        paths.sort();

        results.extend(paths.into_iter().map(|path| match Self::load_dual(&path) {
            Ok(table) => Ok((path, table)),
            Err(e) => Err(TuringMachineError::FileError(format!(
                "Failed to load table from {}: {}",
                path.display(),
                e
            ))),
        }));

        results
    }
}

fn read(path: &Path) -> Result<String, TuringMachineError> {
    fs::read_to_string(path).map_err(|e| {
        TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}
