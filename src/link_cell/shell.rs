//! Concentric cell-offset shells.
//!
//! Shell `N` is the set of integer offsets with Chebyshev norm exactly `N`: the
//! surface of a `(2N+1)³` cube in 3D, or the boundary of a `(2N+1)²` square in 2D.
//!
//! The surface is traced in a fixed order. Four side "wedges" come first
//! (`+y`, `+x`, `-y`, `-x` faces, each sweeping its free in-plane coordinate over
//! `2N` values while z sweeps `-N+1..=N-1`), then in 3D the two `z` caps as full
//! `(2N+1)×(2N+1)` squares (`z = -N` first, then `z = +N`). Shell 0 is the single
//! offset `(0, 0, 0)`. After the last offset of shell `N` the iterator moves on to
//! shell `N+1`, so it never ends.

use glam::IVec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// `y = +N`, x ascending over `-N..N`.
    PosY,
    /// `x = +N`, y descending over `N..-N`.
    PosX,
    /// `y = -N`, x descending over `N..-N`.
    NegY,
    /// `x = -N`, y ascending over `-N..N`.
    NegX,
    /// `z = -N` face.
    NegZCap,
    /// `z = +N` face (also carries the single offset of shell 0).
    PosZCap,
}

/// Cursor over cell offsets in expanding shells.
///
/// Two cursors compare equal iff they sit at the same range, stage, offset and
/// dimensionality, so `CellShellIter::new(n + 1, is_2d)` works as an end sentinel
/// for shell `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellShellIter {
    range: i32,
    stage: Stage,
    x: i32,
    y: i32,
    z: i32,
    is_2d: bool,
}

impl CellShellIter {
    /// Cursor positioned at the first offset of shell `range`.
    pub fn new(range: u32, is_2d: bool) -> Self {
        let range = range as i32;
        if range == 0 {
            return Self {
                range,
                stage: Stage::PosZCap,
                x: 0,
                y: 0,
                z: 0,
                is_2d,
            };
        }
        Self {
            range,
            stage: Stage::PosY,
            x: -range,
            y: range,
            z: if is_2d { 0 } else { -range + 1 },
            is_2d,
        }
    }

    /// Current shell radius.
    #[inline]
    pub fn range(&self) -> u32 {
        self.range as u32
    }

    #[inline]
    pub fn is_2d(&self) -> bool {
        self.is_2d
    }

    /// Offset at the cursor.
    #[inline]
    pub fn offset(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Step the wedge's z sweep. Returns true once the wedge is finished.
    #[inline]
    fn wedge_wrapped(&mut self) -> bool {
        if self.is_2d {
            return true;
        }
        self.z += 1;
        if self.z >= self.range {
            self.z = -self.range + 1;
            true
        } else {
            false
        }
    }

    /// Move to the next offset, rolling over into the next shell when needed.
    pub fn advance(&mut self) {
        let n = self.range;
        match self.stage {
            Stage::PosY => {
                self.x += 1;
                if self.x >= n {
                    self.x = -n;
                    if self.wedge_wrapped() {
                        self.stage = Stage::PosX;
                        self.x = n;
                    }
                }
            }
            Stage::PosX => {
                self.y -= 1;
                if self.y <= -n {
                    self.y = n;
                    if self.wedge_wrapped() {
                        self.stage = Stage::NegY;
                        self.y = -n;
                    }
                }
            }
            Stage::NegY => {
                self.x -= 1;
                if self.x <= -n {
                    self.x = n;
                    if self.wedge_wrapped() {
                        self.stage = Stage::NegX;
                        self.x = -n;
                    }
                }
            }
            Stage::NegX => {
                self.y += 1;
                if self.y >= n {
                    self.y = -n;
                    if self.wedge_wrapped() {
                        if self.is_2d {
                            *self = Self::new(self.range() + 1, true);
                        } else {
                            self.stage = Stage::NegZCap;
                            self.x = -n;
                            self.y = -n;
                            self.z = -n;
                        }
                    }
                }
            }
            Stage::NegZCap | Stage::PosZCap => {
                self.x += 1;
                if self.x > n {
                    self.x = -n;
                    self.y += 1;
                    if self.y > n {
                        self.y = -n;
                        if self.stage == Stage::NegZCap {
                            self.stage = Stage::PosZCap;
                            self.z = n;
                        } else {
                            *self = Self::new(self.range() + 1, self.is_2d);
                        }
                    }
                }
            }
        }
    }
}

impl Iterator for CellShellIter {
    type Item = IVec3;

    /// Yields the current offset and advances. Never returns `None`.
    #[inline]
    fn next(&mut self) -> Option<IVec3> {
        let offset = self.offset();
        self.advance();
        Some(offset)
    }
}

/// All offsets of exactly shell `range`, in enumeration order.
pub fn shell_offsets(range: u32, is_2d: bool) -> Vec<IVec3> {
    let end = CellShellIter::new(range + 1, is_2d);
    let mut iter = CellShellIter::new(range, is_2d);
    let mut out = Vec::with_capacity(shell_len(range, is_2d));
    while iter != end {
        out.push(iter.offset());
        iter.advance();
    }
    out
}

/// Number of offsets in shell `range`.
pub fn shell_len(range: u32, is_2d: bool) -> usize {
    let n = range as usize;
    match (n, is_2d) {
        (0, _) => 1,
        (_, true) => 8 * n,
        (_, false) => 24 * n * n + 2,
    }
}
