//! Progress reporting for long-running generations

use serde::{Deserialize, Serialize};

/// Phase of a generation, in the order the UI shows them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    Connecting,
    ColdStart,
    Analyzing,
    CreatingImage,
    Finalizing,
}

impl GenerationPhase {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Connecting => "Conectando ao servidor...",
            Self::ColdStart => "O servidor está iniciando, isso pode levar até 1 minuto...",
            Self::Analyzing => "Analisando ingredientes e nutrientes...",
            Self::CreatingImage => "Criando imagem do prato...",
            Self::Finalizing => "Finalizando receita...",
        }
    }
}

/// Progress event for UI updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationProgress {
    pub phase: GenerationPhase,
    pub message: String,
    /// 0.0 ..= 1.0
    pub fraction: f32,
}

impl GenerationProgress {
    pub fn new(phase: GenerationPhase, fraction: f32) -> Self {
        Self {
            phase,
            message: phase.message().to_string(),
            fraction,
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: GenerationProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(GenerationProgress) + Send + Sync,
{
    fn report(&self, progress: GenerationProgress) {
        self(progress)
    }
}

/// Sink that drops every event
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: GenerationProgress) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Collects events for assertions
    #[derive(Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<(GenerationProgress, tokio::time::Instant)>>,
    }

    impl RecordingSink {
        pub fn phases(&self) -> Vec<GenerationPhase> {
            self.events.lock().unwrap().iter().map(|(p, _)| p.phase).collect()
        }

        pub fn fractions(&self) -> Vec<f32> {
            self.events.lock().unwrap().iter().map(|(p, _)| p.fraction).collect()
        }

        pub fn timestamps(&self) -> Vec<tokio::time::Instant> {
            self.events.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    impl ProgressSink for RecordingSink {
        fn report(&self, progress: GenerationProgress) {
            self.events
                .lock()
                .unwrap()
                .push((progress, tokio::time::Instant::now()));
        }
    }
}
