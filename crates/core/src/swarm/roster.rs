//! # Agent Roster
//!
//! The sixteen forge agents, in execution and display order.
//!
//! ```text
//! Visual Parser → Web Intel → Design Architect → ... → Symmetry Guard → Vibe Spec → Assembler
//! ```

use serde::{Deserialize, Serialize};

/// Identifier of a forge agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentId {
    VisualParser,
    WebGrounding,
    DesignEngineer,
    MaitreCopywriter,
    SeoStrategist,
    DataModeler,
    AuthSentinel,
    StripeIntegrator,
    BackendForge,
    EdgeOptimizer,
    LegalShield,
    AccessibilityAuditor,
    QaSentinel,
    SymmetryGuard,
    VibeSpecialist,
    MasterAssembler,
}

impl AgentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::VisualParser => "VISUAL_PARSER",
            AgentId::WebGrounding => "WEB_GROUNDING",
            AgentId::DesignEngineer => "DESIGN_ENGINEER",
            AgentId::MaitreCopywriter => "MAITRE_COPYWRITER",
            AgentId::SeoStrategist => "SEO_STRATEGIST",
            AgentId::DataModeler => "DATA_MODELER",
            AgentId::AuthSentinel => "AUTH_SENTINEL",
            AgentId::StripeIntegrator => "STRIPE_INTEGRATOR",
            AgentId::BackendForge => "BACKEND_FORGE",
            AgentId::EdgeOptimizer => "EDGE_OPTIMIZER",
            AgentId::LegalShield => "LEGAL_SHIELD",
            AgentId::AccessibilityAuditor => "ACCESSIBILITY_AUDITOR",
            AgentId::QaSentinel => "QA_SENTINEL",
            AgentId::SymmetryGuard => "SYMMETRY_GUARD",
            AgentId::VibeSpecialist => "VIBE_SPECIALIST",
            AgentId::MasterAssembler => "MASTER_ASSEMBLER",
        }
    }

    /// Static descriptor for this agent
    ///
    /// Variants are declared in roster order, so the discriminant is the index.
    pub fn descriptor(&self) -> &'static AgentDescriptor {
        &ROSTER[*self as usize]
    }
}

/// Immutable description of one forge agent
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AgentDescriptor {
    pub id: AgentId,
    pub label: &'static str,
    pub role: &'static str,
    pub description: &'static str,
    /// Cursor rule reference to the agent's documentation
    pub doc_url: &'static str,
}

/// The roster, in pipeline order
pub static ROSTER: [AgentDescriptor; 16] = [
    AgentDescriptor {
        id: AgentId::VisualParser,
        label: "Visual Parser",
        role: "Semantics",
        description: "Structural scan and UI mapping to @/components/shared/ui.",
        doc_url: "mdc:docs/agents/visual-parser.md",
    },
    AgentDescriptor {
        id: AgentId::WebGrounding,
        label: "Web Intel",
        role: "Context",
        description: "Sync Next.js/Zod/Tailwind docs and starter constraints.",
        doc_url: "mdc:docs/agents/web-grounding.md",
    },
    AgentDescriptor {
        id: AgentId::DesignEngineer,
        label: "Design Architect",
        role: "Aesthetics",
        description: "DNA extraction, tokens, CSS variables and Tailwind theme.",
        doc_url: "mdc:docs/agents/design-engineer.md",
    },
    AgentDescriptor {
        id: AgentId::MaitreCopywriter,
        label: "Maitre Copy",
        role: "Conversion",
        description: "AIDA copywriting for Hero and CTA.",
        doc_url: "mdc:docs/agents/copywriter.md",
    },
    AgentDescriptor {
        id: AgentId::SeoStrategist,
        label: "SEO Strategic",
        role: "Visibility",
        description: "Metadata, OpenGraph and JSON-LD.",
        doc_url: "mdc:docs/agents/seo.md",
    },
    AgentDescriptor {
        id: AgentId::DataModeler,
        label: "Data Modeler",
        role: "Structure",
        description: "Drizzle schema and DB relations.",
        doc_url: "mdc:docs/agents/data.md",
    },
    AgentDescriptor {
        id: AgentId::AuthSentinel,
        label: "Auth Sentinel",
        role: "Security",
        description: "RBAC, middleware and route protection.",
        doc_url: "mdc:docs/agents/auth.md",
    },
    AgentDescriptor {
        id: AgentId::StripeIntegrator,
        label: "Stripe Node",
        role: "Revenue",
        description: "Pricing map and webhook routes.",
        doc_url: "mdc:docs/agents/stripe.md",
    },
    AgentDescriptor {
        id: AgentId::BackendForge,
        label: "Backend Forge",
        role: "Logic",
        description: "Server Actions and Zod validation.",
        doc_url: "mdc:docs/agents/backend.md",
    },
    AgentDescriptor {
        id: AgentId::EdgeOptimizer,
        label: "Edge Opti",
        role: "Perf",
        description: "Cache headers and Edge Runtime.",
        doc_url: "mdc:docs/agents/edge.md",
    },
    AgentDescriptor {
        id: AgentId::LegalShield,
        label: "Legal Shield",
        role: "Compliance",
        description: "Privacy, Terms and GDPR check.",
        doc_url: "mdc:docs/agents/legal.md",
    },
    AgentDescriptor {
        id: AgentId::AccessibilityAuditor,
        label: "A11y Auditor",
        role: "Inclusion",
        description: "ARIA audit and WCAG conformance.",
        doc_url: "mdc:docs/agents/a11y.md",
    },
    AgentDescriptor {
        id: AgentId::QaSentinel,
        label: "QA Sentinel",
        role: "Quality",
        description: "Type-safety and smoke testing.",
        doc_url: "mdc:docs/agents/qa.md",
    },
    AgentDescriptor {
        id: AgentId::SymmetryGuard,
        label: "Symmetry Guard",
        role: "Fidelity",
        description: "Design-to-Code synchronisation.",
        doc_url: "mdc:docs/agents/symmetry.md",
    },
    AgentDescriptor {
        id: AgentId::VibeSpecialist,
        label: "Vibe Spec",
        role: "DX",
        description: ".mdc configuration and Cursor context.",
        doc_url: "mdc:docs/agents/vibe.md",
    },
    AgentDescriptor {
        id: AgentId::MasterAssembler,
        label: "Assembler",
        role: "Packaging",
        description: "Starter-ready ZIP compilation.",
        doc_url: "mdc:docs/agents/assembler.md",
    },
];

/// The roster in pipeline order
pub fn roster() -> &'static [AgentDescriptor] {
    &ROSTER
}
