mod cluster_runs;
mod training_runs;
