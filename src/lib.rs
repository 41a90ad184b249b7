#[allow(non_snake_case)]
pub mod GibbsEquilibrium;
#[allow(non_snake_case)]
pub mod Optimization;
