// Copyright @yucwang 2026

pub mod dao;
pub mod interaction_data;
pub mod material_data;
