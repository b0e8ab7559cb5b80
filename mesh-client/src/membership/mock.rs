//! Mock membership provider for testing.

use super::{MembershipError, MembershipProvider};
use async_trait::async_trait;
use mesh_types::PeerAddress;
use std::sync::{Arc, Mutex};

/// Mock membership provider.
///
/// Returns a configurable address list and records the services queried.
#[derive(Debug, Default)]
pub struct MockMembership {
    inner: Arc<Mutex<MockMembershipInner>>,
}

#[derive(Debug, Default)]
struct MockMembershipInner {
    addresses: Vec<PeerAddress>,
    queried: Vec<String>,
    fail_next: Option<String>,
}

impl MockMembership {
    /// Create a new mock with no running tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock reporting the given addresses.
    pub fn with_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.set_addresses(addresses);
        mock
    }

    /// Replace the reported addresses.
    pub fn set_addresses<I, S>(&self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.lock().unwrap();
        inner.addresses = addresses.into_iter().map(PeerAddress::new).collect();
    }

    /// Cause the next query to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(error.to_string());
    }

    /// Services queried so far, in order.
    pub fn queried(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.queried.clone()
    }
}

impl Clone for MockMembership {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl MembershipProvider for MockMembership {
    async fn running_task_addresses(
        &self,
        service: &str,
    ) -> Result<Vec<PeerAddress>, MembershipError> {
        let mut inner = self.inner.lock().unwrap();
        inner.queried.push(service.to_string());

        if let Some(error) = inner.fail_next.take() {
            return Err(MembershipError::Unavailable(error));
        }

        Ok(inner.addresses.clone())
    }
}
