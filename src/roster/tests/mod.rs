//! Unit tests for the roster bounded context.
