/// assembly of the Gibbs free energy minimization problem of a
/// multicomponent ideal mixture from the element composition matrix,
/// element abundances and standard chemical potentials
pub mod GibbsMinimization;
mod GibbsMinimization_tests;
