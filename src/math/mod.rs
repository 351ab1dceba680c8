// Copyright 2020 @TwoCookingMice

pub mod aabb;
pub mod constants;
pub mod frame;
pub mod interpolator;
pub mod ray;
pub mod spline;
pub mod warp;
