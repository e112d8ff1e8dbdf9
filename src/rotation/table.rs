//! Per-band storage for SH rotation blocks.
//!
//! Blocks are appended strictly in increasing band order and are immutable
//! once pushed. Reads go through [`BandTable::band`], which only hands out
//! finalized blocks, so a band under construction can never be observed.

use crate::util::{ShError, ShResult};

/// Square block of one band, stored row-major with rows indexed by `m` and
/// columns by `n`, both offset by `l`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BandBlock {
    l: i32,
    data: Vec<f64>,
}

impl BandBlock {
    pub(crate) fn new(l: i32, data: Vec<f64>) -> ShResult<Self> {
        let side = (2 * l + 1) as usize;
        if data.len() != side * side {
            return Err(ShError::DimensionMismatch {
                context: "band block entries",
                expected: side * side,
                got: data.len(),
            });
        }
        Ok(Self { l, data })
    }

    pub(crate) fn degree(&self) -> i32 {
        self.l
    }

    pub(crate) fn side(&self) -> usize {
        (2 * self.l + 1) as usize
    }

    pub(crate) fn data(&self) -> &[f64] {
        &self.data
    }

    /// Entry `M(l, m, n)`; fails when `(m, n)` lies outside the band.
    pub(crate) fn get(&self, m: i32, n: i32) -> ShResult<f64> {
        if m.abs() > self.l || n.abs() > self.l {
            return Err(ShError::NumericDegeneracy {
                reason: "rotation recurrence read outside its band",
            });
        }
        let side = self.side();
        let row = (m + self.l) as usize;
        let col = (n + self.l) as usize;
        Ok(self.data[row * side + col])
    }
}

/// Construction progress of a rotation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BuildState {
    Uninitialized,
    Band0Set,
    Band1Set,
    /// Bands below `k` are final; band `k` is being computed.
    BandKBuilding(usize),
    Complete,
}

/// Append-only table of band blocks.
#[derive(Debug)]
pub(crate) struct BandTable {
    blocks: Vec<BandBlock>,
    target: usize,
    state: BuildState,
}

impl BandTable {
    pub(crate) fn new(target: usize) -> Self {
        Self {
            blocks: Vec::with_capacity(target),
            target,
            state: BuildState::Uninitialized,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> BuildState {
        self.state
    }

    /// Marks band `k >= 2` as in progress.
    pub(crate) fn begin_band(&mut self, k: usize) -> ShResult<()> {
        let ready = match self.state {
            BuildState::Band1Set => k == 2,
            BuildState::BandKBuilding(prev) => k == prev + 1 && self.blocks.len() == k,
            _ => false,
        };
        if !ready || k >= self.target {
            return Err(ShError::InvalidArgument {
                reason: "rotation bands must be built in increasing order",
            });
        }
        self.state = BuildState::BandKBuilding(k);
        Ok(())
    }

    /// Finalizes the next band.
    pub(crate) fn push(&mut self, block: BandBlock) -> ShResult<()> {
        let expected = match self.state {
            BuildState::Uninitialized => 0,
            BuildState::Band0Set => 1,
            BuildState::BandKBuilding(k) if self.blocks.len() == k => k,
            _ => {
                return Err(ShError::InvalidArgument {
                    reason: "no rotation band is open for writing",
                })
            }
        };
        if block.degree() as usize != expected {
            return Err(ShError::InvalidArgument {
                reason: "rotation bands must be built in increasing order",
            });
        }
        self.blocks.push(block);
        self.state = if self.blocks.len() == self.target {
            BuildState::Complete
        } else {
            match expected {
                0 => BuildState::Band0Set,
                1 => BuildState::Band1Set,
                k => BuildState::BandKBuilding(k),
            }
        };
        Ok(())
    }

    /// Returns finalized band `l`.
    pub(crate) fn band(&self, l: usize) -> ShResult<&BandBlock> {
        self.blocks.get(l).ok_or(ShError::InvalidArgument {
            reason: "rotation band read before it was finalized",
        })
    }

    /// Consumes a complete table.
    pub(crate) fn finish(self) -> ShResult<Vec<BandBlock>> {
        if self.state != BuildState::Complete {
            return Err(ShError::InvalidArgument {
                reason: "rotation table is incomplete",
            });
        }
        Ok(self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_block(l: i32) -> BandBlock {
        let side = (2 * l + 1) as usize;
        let mut data = vec![0.0; side * side];
        for i in 0..side {
            data[i * side + i] = 1.0;
        }
        BandBlock::new(l, data).unwrap()
    }

    #[test]
    fn walks_states_in_order() {
        let mut table = BandTable::new(4);
        assert_eq!(table.state(), BuildState::Uninitialized);
        table.push(identity_block(0)).unwrap();
        assert_eq!(table.state(), BuildState::Band0Set);
        table.push(identity_block(1)).unwrap();
        assert_eq!(table.state(), BuildState::Band1Set);
        table.begin_band(2).unwrap();
        assert_eq!(table.state(), BuildState::BandKBuilding(2));
        assert!(table.band(2).is_err());
        table.push(identity_block(2)).unwrap();
        table.begin_band(3).unwrap();
        table.push(identity_block(3)).unwrap();
        assert_eq!(table.state(), BuildState::Complete);
        assert_eq!(table.finish().unwrap().len(), 4);
    }

    #[test]
    fn rejects_skipped_or_repeated_bands() {
        let mut table = BandTable::new(4);
        assert!(table.push(identity_block(1)).is_err());
        table.push(identity_block(0)).unwrap();
        table.push(identity_block(1)).unwrap();
        assert!(table.push(identity_block(2)).is_err());
        assert!(table.begin_band(3).is_err());
        table.begin_band(2).unwrap();
        assert!(table.begin_band(3).is_err());
        assert!(table.push(identity_block(3)).is_err());
        assert!(table.finish().is_err());
    }

    #[test]
    fn block_reads_are_bounds_checked() {
        let block = identity_block(1);
        assert_eq!(block.get(-1, -1), Ok(1.0));
        assert_eq!(block.get(1, -1), Ok(0.0));
        assert!(matches!(
            block.get(2, 0),
            Err(ShError::NumericDegeneracy { .. })
        ));
        assert!(BandBlock::new(1, vec![0.0; 4]).is_err());
    }
}
