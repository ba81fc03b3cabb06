//! Named intervals in semitones.
//!
//! Enharmonic names share values: `d5` and `A4` are both 6.

#![allow(non_upper_case_globals)]

pub const P1: i32 = 0;
pub const d2: i32 = 0;
pub const m2: i32 = 1;
pub const A1: i32 = 1;
pub const M2: i32 = 2;
pub const d3: i32 = 2;
pub const m3: i32 = 3;
pub const A2: i32 = 3;
pub const M3: i32 = 4;
pub const d4: i32 = 4;
pub const P4: i32 = 5;
pub const A3: i32 = 5;
pub const d5: i32 = 6;
pub const A4: i32 = 6;
pub const P5: i32 = 7;
pub const d6: i32 = 7;
pub const m6: i32 = 8;
pub const A5: i32 = 8;
pub const M6: i32 = 9;
pub const d7: i32 = 9;
pub const m7: i32 = 10;
pub const A6: i32 = 10;
pub const M7: i32 = 11;
pub const d8: i32 = 11;
pub const P8: i32 = 12;
pub const A7: i32 = 12;
