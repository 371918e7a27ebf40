//! Per-phase prompts and headings.

use sdlcflow_phase_api::{HandlerResult, Phase};

/// Static description of one phase agent.
///
/// The default [`AgentProfile::refine`] advances to the next phase in the fixed
/// order and keeps the confirmation gate.
pub trait AgentProfile: Send + Sync + 'static {
    const ID: &'static str;
    const PHASE: Phase;
    const SYSTEM_PROMPT: &'static str;
    /// Heading above the rendered history
    const CONTEXT_HEADING: &'static str;
    /// Heading above the user message
    const INPUT_HEADING: &'static str;
    /// Substituted when no user message is supplied
    const DEFAULT_INPUT: &'static str;

    /// Adjust the baseline result for this phase.
    fn refine(result: &mut HandlerResult) {
        result.suggested_next_phase = Self::PHASE.next();
    }
}

pub struct RequirementIntake;

impl AgentProfile for RequirementIntake {
    const ID: &'static str = "requirement_intake";
    const PHASE: Phase = Phase::Intake;
    const SYSTEM_PROMPT: &'static str = "You are a business analyst specializing in capturing software requirements. \
         Summarize the user's goals, functional requirements, non-functional criteria, \
         and any constraints. Ask clarifying questions when information is missing.";
    const CONTEXT_HEADING: &'static str = "Context so far";
    const INPUT_HEADING: &'static str = "New stakeholder input";
    const DEFAULT_INPUT: &'static str = "No new message provided.";
}

pub struct SolutionAnalysis;

impl AgentProfile for SolutionAnalysis {
    const ID: &'static str = "solution_analysis";
    const PHASE: Phase = Phase::Analysis;
    const SYSTEM_PROMPT: &'static str = "You are a solution architect. Analyze gathered requirements and outline \
         key domain concepts, risks, and architectural decisions. Recommend the \
         target architecture style and integration points.";
    const CONTEXT_HEADING: &'static str = "Prior context and requirements";
    const INPUT_HEADING: &'static str = "Additional analyst notes";
    const DEFAULT_INPUT: &'static str = "No additional notes provided.";
}

pub struct SolutionDesign;

impl AgentProfile for SolutionDesign {
    const ID: &'static str = "solution_design";
    const PHASE: Phase = Phase::Design;
    const SYSTEM_PROMPT: &'static str = "You are a software designer. Produce a high-level design including \
         component diagram narrative, data model sketches, and API contracts. \
         Tailor the solution to the preferred tech stack when specified.";
    const CONTEXT_HEADING: &'static str = "Requirements and analysis summary";
    const INPUT_HEADING: &'static str = "Design considerations from user";
    const DEFAULT_INPUT: &'static str = "No additional design considerations.";
}

pub struct Implementation;

impl AgentProfile for Implementation {
    const ID: &'static str = "implementation";
    const PHASE: Phase = Phase::Implementation;
    const SYSTEM_PROMPT: &'static str = "You are a senior software engineer. Produce implementation guidance including \
         code scaffolding, libraries to use, and best practices for maintainability.";
    const CONTEXT_HEADING: &'static str = "Design blueprint and context";
    const INPUT_HEADING: &'static str = "Specific implementation request";
    const DEFAULT_INPUT: &'static str = "No additional requests.";
}

pub struct Testing;

impl AgentProfile for Testing {
    const ID: &'static str = "testing";
    const PHASE: Phase = Phase::Testing;
    const SYSTEM_PROMPT: &'static str = "You are a QA lead. Devise unit, integration, and functional testing strategies. \
         Highlight automated test coverage and manual validation steps.";
    const CONTEXT_HEADING: &'static str = "Implementation context";
    const INPUT_HEADING: &'static str = "Testing feedback or constraints";
    const DEFAULT_INPUT: &'static str = "No additional constraints.";
}

pub struct Deployment;

impl AgentProfile for Deployment {
    const ID: &'static str = "deployment";
    const PHASE: Phase = Phase::Deployment;
    const SYSTEM_PROMPT: &'static str = "You are a DevOps engineer. Provide a deployment and release plan covering \
         infrastructure requirements, CI/CD pipeline steps, observability, and rollback strategy.";
    const CONTEXT_HEADING: &'static str = "Testing outcomes and context";
    const INPUT_HEADING: &'static str = "Deployment constraints";
    const DEFAULT_INPUT: &'static str = "No additional constraints.";
}

pub struct Retrospective;

impl AgentProfile for Retrospective {
    const ID: &'static str = "retrospective";
    const PHASE: Phase = Phase::Retrospective;
    const SYSTEM_PROMPT: &'static str = "You are an agile coach. Summarize the overall engagement, highlight successes, \
         lessons learned, and recommendations for future iterations.";
    const CONTEXT_HEADING: &'static str = "Full workflow context";
    const INPUT_HEADING: &'static str = "Stakeholder feedback for retrospective";
    const DEFAULT_INPUT: &'static str = "No additional feedback provided.";

    // Last phase: complete the workflow without another gate.
    fn refine(result: &mut HandlerResult) {
        result.suggested_next_phase = None;
        result.requires_confirmation = false;
    }
}

/// Handler identifier bound to `phase` by the default registry.
#[must_use]
pub const fn handler_id(phase: Phase) -> &'static str {
    match phase {
        Phase::Intake => RequirementIntake::ID,
        Phase::Analysis => SolutionAnalysis::ID,
        Phase::Design => SolutionDesign::ID,
        Phase::Implementation => Implementation::ID,
        Phase::Testing => Testing::ID,
        Phase::Deployment => Deployment::ID,
        Phase::Retrospective => Retrospective::ID,
    }
}
