//! Redpanda health checks.

use crate::config::RedpandaConfig;
use crate::consumer::client_builder;
use tracing::{debug, error};

/// Check Redpanda connection health and that the person topic exists.
pub async fn check_connection(config: &RedpandaConfig) -> bool {
    let client = match client_builder(config).build().await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to Redpanda: {}", e);
            return false;
        }
    };

    match client.list_topics().await {
        Ok(topics) => {
            let found = topics.iter().any(|t| t.name == config.consumer.topic);
            if !found {
                error!(topic = %config.consumer.topic, "Person topic does not exist");
            } else {
                debug!(topics = topics.len(), "Redpanda connection healthy");
            }
            found
        }
        Err(e) => {
            error!("Failed to list Redpanda topics: {}", e);
            false
        }
    }
}
