//! Haplogroup frequency tables for ancient-DNA populations.
//!
//! Samples are grouped by region and a fixed-width BP age bin. Basal
//! haplogroups are reported as a share of the group; numbered subclades as a
//! share of their basal lineage within the same group.

pub mod age;
pub mod aggregate;
pub mod app;
pub mod classify;
pub mod config;
pub mod coords;
pub mod domain;
pub mod error;
pub mod group;
pub mod output;
pub mod percent;
pub mod pipeline;
pub mod records;
pub mod store;
pub mod table;
