mod admission_test;
mod chunk_plan_test;
mod status_aggregator_test;
mod submission_test;
