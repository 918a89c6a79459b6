// Re-export async trait for convenience
pub use async_trait::async_trait;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix written before every serialized [`RouterLog`] line on stderr.
pub const EVENT_PREFIX: &str = "__ROUTER_EVENT__:";

/// Structured logging events emitted while a query moves through the router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterLog {
    /// A query was accepted and a workflow run created for it
    RunStarted { run_id: Uuid, query: String },
    /// The workflow entered a stage
    StageEntered { run_id: Uuid, stage: String },
    /// Classification finished and an engine set was chosen
    QueryRouted {
        run_id: Uuid,
        query_type: String,
        confidence: f64,
        agents: Vec<String>,
        strategy: String,
    },
    /// Routing failed; the run goes straight to the end stage
    RoutingFailed { run_id: Uuid, error: String },
    /// Agent started (engine call or model call within a run)
    AgentStarted {
        task_id: String,
        agent_name: String,
        description: String,
    },
    /// Agent message (streaming text)
    AgentMessage {
        task_id: String,
        agent_name: String,
        message: String,
    },
    /// Agent completed
    AgentCompleted {
        task_id: String,
        agent_name: String,
        result: Option<String>,
    },
    /// Agent failed
    AgentFailed {
        task_id: String,
        agent_name: String,
        error: String,
    },
    /// The hybrid narrative merge failed and the concatenation was used instead
    SynthesisFallback { run_id: Uuid, error: String },
    /// Final response built
    ResponseReady {
        run_id: Uuid,
        success: bool,
        agents: Vec<String>,
        elapsed_ms: u64,
    },
    /// Something escaped the workflow and was caught at the entry point
    RunFailed { run_id: Uuid, error: String },
}

impl RouterLog {
    /// Render this event as a single prefixed line
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self)
            .ok()
            .map(|json| format!("{}{}", EVENT_PREFIX, json))
    }

    /// Parse a line previously produced by [`RouterLog::to_line`]
    pub fn from_line(line: &str) -> Option<Self> {
        line.strip_prefix(EVENT_PREFIX)
            .and_then(|json| serde_json::from_str(json).ok())
    }

    /// Emit this log event to stderr
    pub fn emit(&self) {
        if let Some(line) = self.to_line() {
            use std::io::Write;
            eprintln!("{}", line);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }
}

#[macro_export]
macro_rules! log_run_start {
    ($run_id:expr, $query:expr) => {
        $crate::RouterLog::RunStarted {
            run_id: $run_id,
            query: $query.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage {
    ($run_id:expr, $stage:expr) => {
        $crate::RouterLog::StageEntered {
            run_id: $run_id,
            stage: $stage.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_routed {
    ($run_id:expr, $query_type:expr, $confidence:expr, $agents:expr, $strategy:expr) => {
        $crate::RouterLog::QueryRouted {
            run_id: $run_id,
            query_type: $query_type.to_string(),
            confidence: $confidence,
            agents: $agents,
            strategy: $strategy.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_routing_failed {
    ($run_id:expr, $error:expr) => {
        $crate::RouterLog::RoutingFailed {
            run_id: $run_id,
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_start {
    ($task_id:expr, $agent:expr, $desc:expr) => {
        $crate::RouterLog::AgentStarted {
            task_id: $task_id.to_string(),
            agent_name: $agent.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_message {
    ($task_id:expr, $agent:expr, $msg:expr) => {
        $crate::RouterLog::AgentMessage {
            task_id: $task_id.to_string(),
            agent_name: $agent.to_string(),
            message: $msg.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_complete {
    ($task_id:expr, $agent:expr) => {
        $crate::RouterLog::AgentCompleted {
            task_id: $task_id.to_string(),
            agent_name: $agent.to_string(),
            result: None,
        }
        .emit();
    };
    ($task_id:expr, $agent:expr, $result:expr) => {
        $crate::RouterLog::AgentCompleted {
            task_id: $task_id.to_string(),
            agent_name: $agent.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_failed {
    ($task_id:expr, $agent:expr, $error:expr) => {
        $crate::RouterLog::AgentFailed {
            task_id: $task_id.to_string(),
            agent_name: $agent.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_synthesis_fallback {
    ($run_id:expr, $error:expr) => {
        $crate::RouterLog::SynthesisFallback {
            run_id: $run_id,
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_response_ready {
    ($run_id:expr, $success:expr, $agents:expr, $elapsed_ms:expr) => {
        $crate::RouterLog::ResponseReady {
            run_id: $run_id,
            success: $success,
            agents: $agents,
            elapsed_ms: $elapsed_ms,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_run_failed {
    ($run_id:expr, $error:expr) => {
        $crate::RouterLog::RunFailed {
            run_id: $run_id,
            error: $error.to_string(),
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros (for the interactive CLI)
// ============================================================================
// Colored, human-readable output. These go to stdout and complement the
// structured RouterLog events on stderr.
// ============================================================================

/// Logs a section header.
///
/// # Example
/// ```
/// use trends_router_sdk::log_header;
/// log_header!("YouTube Trends Router");
/// ```
///
/// Outputs:
/// ```text
/// ═══ YouTube Trends Router ═══
/// ```
#[macro_export]
macro_rules! log_header {
    ($title:expr) => {
        println!("\x1b[1;36m═══ {} ═══\x1b[0m", $title);
    };
}

/// Logs an informational message.
///
/// # Example
/// ```
/// use trends_router_sdk::log_info;
/// log_info!("Loading settings...");
/// ```
///
/// Outputs:
/// ```text
/// ℹ Loading settings...
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// # Example
/// ```
/// use trends_router_sdk::log_warning;
/// log_warning!("Semantic engine disabled");
/// ```
///
/// Outputs:
/// ```text
/// ⚠ Warning: Semantic engine disabled
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
///
/// # Example
/// ```
/// use trends_router_sdk::log_file_saved;
/// log_file_saved!("./OUTPUT/query_response_20250101_120000.json");
/// ```
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}

/// Logs a debug message (intended to be used conditionally).
///
/// # Example
/// ```
/// use trends_router_sdk::log_debug;
/// let count = 3;
/// log_debug!("Loaded {} filters", count);
/// ```
///
/// Outputs:
/// ```text
/// [DEBUG] Loaded 3 filters
/// ```
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", format!($fmt, $($arg)*));
    };
}
