mod bootstrap_test;
mod failover_test;
