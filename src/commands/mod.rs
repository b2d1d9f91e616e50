// Stack convergence commands
pub mod stack;
