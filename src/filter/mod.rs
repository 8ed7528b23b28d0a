//! Построение графов фильтров FFmpeg
//!
//! `graph` описывает узлы и их сериализацию, `builder` собирает из параметров
//! микширования конкретные цепочки.

pub mod graph;
pub mod builder;

pub use graph::{Filter, FilterChain, FilterGraph, FilterNode, FilterParam};
pub use builder::{
    build_asmr_optimization_chain, build_binaural_graph, build_mixing_graph,
    build_normalization_chain, DEFAULT_TARGET_LUFS,
};
