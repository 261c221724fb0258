//! JSON-facing representation of a stored collation.
//!
//! The storage layer keeps the matrix as rows of signed integers, with `-1`
//! marking an empty cell, alongside the witness token lists, one siglum per
//! witness, and the column grouping. Everything arriving from storage is
//! validated before a `CollationMatrix` is built from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::MatrixError,
    matrix::{CollationMatrix, ColumnGroupIndex},
    token::Witness,
};

/// The value marking an empty cell on the wire.
const EMPTY_CELL: i64 = -1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{witnesses} witnesses but {sigla} sigla")]
    SiglaCountMismatch { witnesses: usize, sigla: usize },

    #[error("{witnesses} witnesses but {rows} matrix rows")]
    RowCountMismatch { witnesses: usize, rows: usize },

    #[error("witness order is not a permutation of 0..{witnesses}")]
    InvalidWitnessOrder { witnesses: usize },

    /// Cells are token indices or `-1`; anything else is corrupt data.
    #[error("cell ({row}, {col}) holds invalid value {value}")]
    InvalidCellValue { row: usize, col: usize, value: i64 },

    #[error(transparent)]
    InvalidMatrix(#[from] MatrixError),
}

/// A complete collation as stored and transmitted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollationData {
    /// One siglum per witness, in row order.
    pub sigla: Vec<String>,
    pub witnesses: Vec<Witness>,
    /// Row-major token indices; `-1` is an empty cell.
    pub collation_matrix: Vec<Vec<i64>>,
    /// Columns grouped with their right-hand neighbour.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grouped_with_next: Vec<usize>,
    /// Display order of the rows; empty means natural order. The engine
    /// never reorders rows, this is carried through for the presentation
    /// layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub witness_order: Vec<usize>,
}

impl CollationData {
    /// Validates the stored form and builds the matrix it describes.
    ///
    /// # Errors
    ///
    /// Fails on mismatched counts, cell values other than `-1` or a token
    /// index, and anything `CollationMatrix::from_witnesses` rejects.
    pub fn to_matrix(&self) -> Result<(CollationMatrix, Vec<String>), TransportError> {
        if self.sigla.len() != self.witnesses.len() {
            return Err(TransportError::SiglaCountMismatch {
                witnesses: self.witnesses.len(),
                sigla: self.sigla.len(),
            });
        }
        if self.collation_matrix.len() != self.witnesses.len() {
            return Err(TransportError::RowCountMismatch {
                witnesses: self.witnesses.len(),
                rows: self.collation_matrix.len(),
            });
        }
        if !self.witness_order.is_empty() {
            let mut seen = vec![false; self.witnesses.len()];
            for &row in &self.witness_order {
                if row >= seen.len() || seen[row] {
                    return Err(TransportError::InvalidWitnessOrder {
                        witnesses: self.witnesses.len(),
                    });
                }
                seen[row] = true;
            }
            if self.witness_order.len() != self.witnesses.len() {
                return Err(TransportError::InvalidWitnessOrder {
                    witnesses: self.witnesses.len(),
                });
            }
        }

        let mut cells = Vec::with_capacity(self.collation_matrix.len());
        for (row, wire_row) in self.collation_matrix.iter().enumerate() {
            let mut converted = Vec::with_capacity(wire_row.len());
            for (col, &value) in wire_row.iter().enumerate() {
                if value == EMPTY_CELL {
                    converted.push(None);
                } else {
                    let index = usize::try_from(value)
                        .map_err(|_| TransportError::InvalidCellValue { row, col, value })?;
                    converted.push(Some(index));
                }
            }
            cells.push(converted);
        }

        let mut matrix = CollationMatrix::from_witnesses(self.witnesses.clone(), cells)?;
        matrix.set_groups(ColumnGroupIndex::with_grouped(
            matrix.column_count(),
            self.grouped_with_next.iter().copied(),
        ));

        Ok((matrix, self.sigla.clone()))
    }

    /// The stored form of `matrix`, with one siglum per row.
    ///
    /// # Errors
    ///
    /// Fails when `sigla` does not have one entry per matrix row.
    pub fn from_matrix(
        matrix: &CollationMatrix,
        sigla: Vec<String>,
    ) -> Result<Self, TransportError> {
        if sigla.len() != matrix.row_count() {
            return Err(TransportError::SiglaCountMismatch {
                witnesses: matrix.row_count(),
                sigla: sigla.len(),
            });
        }

        let collation_matrix = (0..matrix.row_count())
            .map(|row| {
                matrix
                    .row(row)
                    .iter()
                    .map(|cell| {
                        cell.map_or(EMPTY_CELL, |index| {
                            i64::try_from(index).unwrap_or(i64::MAX)
                        })
                    })
                    .collect()
            })
            .collect();
        let witnesses = (0..matrix.row_count())
            .map(|row| matrix.witness(row).clone())
            .collect();
        let grouped_with_next = (0..matrix.column_count())
            .filter(|&col| matrix.column_groups().is_grouped_with_next(col))
            .collect();

        Ok(Self {
            sigla,
            witnesses,
            collation_matrix,
            grouped_with_next,
            witness_order: Vec::new(),
        })
    }
}
