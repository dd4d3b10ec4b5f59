//! Fixed catalog of UML diagram categories
//!
//! Each category carries the prompt prefix that is prepended to the user's
//! description when a generation request is built.

use serde::Serialize;

use super::error::CategoryNotFound;

/// An immutable catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramCategory {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub prompt_prefix: &'static str,
}

impl DiagramCategory {
    /// Build the full generation prompt for a description
    pub fn prompt_for(&self, description: &str) -> String {
        format!("{}\n{}", self.prompt_prefix, description)
    }
}

const CATALOG: &[DiagramCategory] = &[
    DiagramCategory {
        id: "use-case",
        title: "Use Case Diagram",
        description: "Captures functional requirements by illustrating interactions between users and the system.",
        prompt_prefix: "Create a UML Use Case diagram for the following system description:",
    },
    DiagramCategory {
        id: "class",
        title: "Class Diagram",
        description: "Shows the static structure of a system by displaying classes, attributes, methods, and relationships.",
        prompt_prefix: "Create a UML Class diagram for the following system description:",
    },
    DiagramCategory {
        id: "sequence",
        title: "Sequence Diagram",
        description: "Illustrates how objects interact in a scenario, focusing on the sequence of messages exchanged over time.",
        prompt_prefix: "Create a UML Sequence diagram for the following scenario:",
    },
    DiagramCategory {
        id: "activity",
        title: "Activity Diagram",
        description: "Models the workflow of stepwise activities and actions within a system, similar to a flowchart.",
        prompt_prefix: "Create a UML Activity diagram for the following process:",
    },
    DiagramCategory {
        id: "state-machine",
        title: "State Machine Diagram",
        description: "Describes the states of an object and the transitions between states due to events.",
        prompt_prefix: "Create a UML State Machine diagram for the following object behavior:",
    },
    DiagramCategory {
        id: "component",
        title: "Component Diagram",
        description: "Represents the organization and dependencies among components in a system.",
        prompt_prefix: "Create a UML Component diagram for the following system architecture:",
    },
    DiagramCategory {
        id: "deployment",
        title: "Deployment Diagram",
        description: "Illustrates the physical deployment of artifacts on hardware devices.",
        prompt_prefix: "Create a UML Deployment diagram for the following system deployment:",
    },
    DiagramCategory {
        id: "package",
        title: "Package Diagram",
        description: "Organizes elements of a model into groups or packages, showing dependencies between packages.",
        prompt_prefix: "Create a UML Package diagram for the following system organization:",
    },
];

/// Lookup table over the fixed catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRegistry;

impl TypeRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Find a category by its slug
    pub fn lookup(&self, id: &str) -> Result<&'static DiagramCategory, CategoryNotFound> {
        CATALOG
            .iter()
            .find(|category| category.id == id)
            .ok_or_else(|| CategoryNotFound { id: id.to_string() })
    }

    /// All categories in display order
    pub fn all(&self) -> &'static [DiagramCategory] {
        CATALOG
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> {
        CATALOG.iter().map(|category| category.id)
    }

    pub fn len(&self) -> usize {
        CATALOG.len()
    }

    pub fn is_empty(&self) -> bool {
        CATALOG.is_empty()
    }
}
