//! Offline provider that answers with canned diagrams
//!
//! Picks a fixed Mermaid diagram for the category whose prompt prefix starts
//! the request prompt, ignoring the description. Useful for demos without an
//! API key and as a drop-in test double; it never talks to a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::core::{DiagramCategory, ProviderClient, ProviderError, ProviderRequest, TypeRegistry};

const FALLBACK: &str = "graph TD\n    A[Start] --> B[End]";

fn diagram_for(category_id: &str) -> &'static str {
    match category_id {
        "use-case" => {
            "classDiagram\n    class User {\n    }\n    class System {\n        +login()\n        +logout()\n        +viewProfile()\n    }\n    User --> System : uses"
        }
        "class" => {
            "classDiagram\n    class Customer {\n        +String name\n        +String email\n        +placeOrder()\n    }\n    class Order {\n        +int orderId\n        +Date orderDate\n        +float total\n        +processPayment()\n    }\n    class Product {\n        +int productId\n        +String name\n        +float price\n        +checkAvailability()\n    }\n    Customer \"1\" --> \"many\" Order : places\n    Order \"1\" --> \"many\" Product : contains"
        }
        "sequence" => {
            "sequenceDiagram\n    participant User\n    participant System\n    participant Database\n\n    User->>System: Login Request\n    System->>Database: Validate Credentials\n    Database-->>System: Authentication Result\n    System-->>User: Login Response"
        }
        "activity" => {
            "graph TD\n    A[Start] --> B{User Authenticated?}\n    B -->|Yes| C[Show Dashboard]\n    B -->|No| D[Show Login Form]\n    D --> E[User Enters Credentials]\n    E --> B\n    C --> F[User Selects Action]\n    F --> G[Process Action]\n    G --> H[End]"
        }
        "state-machine" => {
            "stateDiagram-v2\n    [*] --> Idle\n    Idle --> Processing: Submit\n    Processing --> Success: Valid\n    Processing --> Error: Invalid\n    Success --> Idle: Reset\n    Error --> Idle: Reset\n    Idle --> [*]: Exit"
        }
        "component" => {
            "graph TD\n    A[Frontend] --> B[API Gateway]\n    B --> C[Authentication Service]\n    B --> D[User Service]\n    B --> E[Order Service]\n    D --> F[(User Database)]\n    E --> G[(Order Database)]"
        }
        "deployment" => {
            "graph TD\n    A[Client Browser] --> B[Load Balancer]\n    B --> C[Web Server 1]\n    B --> D[Web Server 2]\n    C --> E[Application Server]\n    D --> E\n    E --> F[(Database Server)]"
        }
        "package" => {
            "graph TD\n    A[UI Package] --> B[Service Package]\n    B --> C[Repository Package]\n    C --> D[Model Package]\n    B --> D"
        }
        _ => FALLBACK,
    }
}

/// Canned-response provider
#[derive(Debug, Default)]
pub struct PlaceholderProvider {
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl PlaceholderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate provider latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests answered so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn category_of(prompt: &str) -> Option<&'static DiagramCategory> {
        TypeRegistry::new()
            .all()
            .iter()
            .find(|category| prompt.starts_with(category.prompt_prefix))
    }
}

#[async_trait]
impl ProviderClient for PlaceholderProvider {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let category_id = Self::category_of(&request.prompt).map_or("", |category| category.id);
        debug!(category = category_id, "Answering with placeholder diagram");
        Ok(format!("```mermaid\n{}\n```", diagram_for(category_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{detect, extract, DiagramKind, ProviderConfig};

    fn request_for(category_id: &str) -> ProviderRequest {
        let category = TypeRegistry::new().lookup(category_id).unwrap();
        ProviderRequest::new(
            &ProviderConfig::default(),
            category.prompt_for("anything at all"),
        )
    }

    #[tokio::test]
    async fn test_answers_per_category() {
        let provider = PlaceholderProvider::new();
        let raw = provider.complete(&request_for("sequence")).await.unwrap();
        assert!(raw.starts_with("```mermaid\n"));
        assert_eq!(detect(&extract(&raw)), Some(DiagramKind::Sequence));

        let raw = provider.complete(&request_for("state-machine")).await.unwrap();
        assert_eq!(detect(&extract(&raw)), Some(DiagramKind::State));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_every_category_gets_a_diagram() {
        let provider = PlaceholderProvider::new();
        for category in TypeRegistry::new().all() {
            let raw = provider.complete(&request_for(category.id)).await.unwrap();
            assert_ne!(extract(&raw), FALLBACK, "category {}", category.id);
        }
    }

    #[tokio::test]
    async fn test_unknown_prompt_falls_back() {
        let request = ProviderRequest::new(&ProviderConfig::default(), "free-form");
        let raw = PlaceholderProvider::new().complete(&request).await.unwrap();
        assert_eq!(extract(&raw), FALLBACK);
    }
}
