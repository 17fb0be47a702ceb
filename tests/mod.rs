mod calendar_store_mock;
mod channel_sender_mock;

// This file organizes the integration tests into a cohesive test suite.
// Each module tests a specific aspect of the application:
// - smoke_tests: Basic functionality tests to ensure nothing is broken
// - calendar_store_mock: Calendar sync passes against an in-memory calendar
// - channel_sender_mock: Notify passes against recording SNS senders
