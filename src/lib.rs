// Copyright @yucwang 2026

#![allow(dead_code)]

pub extern crate nalgebra as na;

pub mod core;
pub mod data;
pub mod engine;
pub mod grid;
pub mod interactions;
pub mod math;
pub mod runners;
pub mod sources;
pub mod tallies;
