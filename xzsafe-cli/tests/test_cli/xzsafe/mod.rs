mod basic;
mod check;
mod edge_cases;
