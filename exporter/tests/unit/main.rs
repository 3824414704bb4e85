mod test_coordinator;
mod test_server;
