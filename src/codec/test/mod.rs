//! Synthetic PBF fixtures shared by the unit tests and benches.
