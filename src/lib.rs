//! Student clustering and team formation toolkit: preprocess raw student
//! records, convert skills to High/Medium/Low levels, cluster with k-means,
//! and slice clusters into fixed-size teams.

pub mod cluster;
pub mod levels;
pub mod models;
pub mod plots;
pub mod predict;
pub mod preprocess;
pub mod report;
pub mod table;
pub mod teams;
