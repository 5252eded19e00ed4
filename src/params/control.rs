use std::sync::mpsc;

use crate::{
    foundation::error::{QuiltError, QuiltResult},
    params::{config::SceneElement, store::ParamKey},
};

/// Named numeric controls of the debug panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DebugControl {
    DiscY,
    DiscZ,
    DiscScale,
    LabelY,
    LabelZ,
    LabelScale,
    TimerY,
    TimerZ,
    TimerScale,
    ViewCone,
    CamDist,
    CenterOffset,
}

/// What a control changes on the live renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlTarget {
    PositionY(SceneElement),
    PositionZ(SceneElement),
    Scale(SceneElement),
    ViewCone,
    CameraDistance,
    CenterOffset,
}

impl DebugControl {
    pub const ALL: [DebugControl; 12] = [
        DebugControl::DiscY,
        DebugControl::DiscZ,
        DebugControl::DiscScale,
        DebugControl::LabelY,
        DebugControl::LabelZ,
        DebugControl::LabelScale,
        DebugControl::TimerY,
        DebugControl::TimerZ,
        DebugControl::TimerScale,
        DebugControl::ViewCone,
        DebugControl::CamDist,
        DebugControl::CenterOffset,
    ];

    /// Panel element id.
    pub fn id(self) -> &'static str {
        match self {
            DebugControl::DiscY => "torus-y",
            DebugControl::DiscZ => "torus-z",
            DebugControl::DiscScale => "disc-scale",
            DebugControl::LabelY => "taskname-y",
            DebugControl::LabelZ => "taskname-z",
            DebugControl::LabelScale => "taskname-scale",
            DebugControl::TimerY => "timer-y",
            DebugControl::TimerZ => "timer-z",
            DebugControl::TimerScale => "timer-scale",
            DebugControl::ViewCone => "view-cone",
            DebugControl::CamDist => "cam-dist",
            DebugControl::CenterOffset => "center-offset",
        }
    }

    /// Accepts either the panel id or the storage key.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == name || c.key().as_str() == name)
    }

    pub fn key(self) -> ParamKey {
        match self {
            DebugControl::DiscY => ParamKey::PosY,
            DebugControl::DiscZ => ParamKey::PosZ,
            DebugControl::DiscScale => ParamKey::DiscScale,
            DebugControl::LabelY => ParamKey::TaskNameY,
            DebugControl::LabelZ => ParamKey::TaskNameZ,
            DebugControl::LabelScale => ParamKey::TaskNameScale,
            DebugControl::TimerY => ParamKey::TimerY,
            DebugControl::TimerZ => ParamKey::TimerZ,
            DebugControl::TimerScale => ParamKey::TimerScale,
            DebugControl::ViewCone => ParamKey::ViewCone,
            DebugControl::CamDist => ParamKey::CamDist,
            DebugControl::CenterOffset => ParamKey::CenterOffset,
        }
    }

    pub fn target(self) -> ControlTarget {
        use SceneElement::*;
        match self {
            DebugControl::DiscY => ControlTarget::PositionY(GlowDisc),
            DebugControl::DiscZ => ControlTarget::PositionZ(GlowDisc),
            DebugControl::DiscScale => ControlTarget::Scale(GlowDisc),
            DebugControl::LabelY => ControlTarget::PositionY(LabelCard),
            DebugControl::LabelZ => ControlTarget::PositionZ(LabelCard),
            DebugControl::LabelScale => ControlTarget::Scale(LabelCard),
            DebugControl::TimerY => ControlTarget::PositionY(TimerGroup),
            DebugControl::TimerZ => ControlTarget::PositionZ(TimerGroup),
            DebugControl::TimerScale => ControlTarget::Scale(TimerGroup),
            DebugControl::ViewCone => ControlTarget::ViewCone,
            DebugControl::CamDist => ControlTarget::CameraDistance,
            DebugControl::CenterOffset => ControlTarget::CenterOffset,
        }
    }

    /// Value as the panel labels it.
    pub fn display_value(self, raw: &str) -> String {
        match self {
            DebugControl::ViewCone => format!("{raw}°"),
            _ => raw.to_string(),
        }
    }
}

/// A single mutation coming from the debug panel.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlCommand {
    pub control: DebugControl,
    /// Raw input text, persisted verbatim.
    pub raw: String,
    pub value: f64,
}

impl ControlCommand {
    /// Parse panel input. Numbers that are not finite in single precision are rejected.
    pub fn parse(control: DebugControl, raw: &str) -> QuiltResult<Self> {
        let raw = raw.trim();
        let value = raw.parse::<f64>().map_err(|_| {
            QuiltError::validation(format!("control '{}' expects a number, got '{raw}'", control.id()))
        })?;
        if !(value as f32).is_finite() {
            return Err(QuiltError::validation(format!(
                "control '{}' expects a finite number within f32 range",
                control.id()
            )));
        }
        Ok(Self {
            control,
            raw: raw.to_string(),
            value,
        })
    }

    pub fn from_value(control: DebugControl, value: f64) -> QuiltResult<Self> {
        Self::parse(control, &value.to_string())
    }
}

/// Sending half handed to the panel layer.
#[derive(Clone, Debug)]
pub struct ControlSender {
    tx: mpsc::Sender<ControlCommand>,
}

impl ControlSender {
    /// Queue a command. Returns `false` once the renderer is gone.
    pub fn send(&self, cmd: ControlCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    /// Parse and queue panel input.
    pub fn send_input(&self, control: DebugControl, raw: &str) -> QuiltResult<bool> {
        Ok(self.send(ControlCommand::parse(control, raw)?))
    }
}

/// Receiving half, drained by the renderer on its own thread.
#[derive(Debug)]
pub struct ControlChannel {
    tx: mpsc::Sender<ControlCommand>,
    rx: mpsc::Receiver<ControlCommand>,
}

impl Default for ControlChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> ControlSender {
        ControlSender {
            tx: self.tx.clone(),
        }
    }

    /// Everything queued so far, in send order.
    pub fn drain(&self) -> Vec<ControlCommand> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/control.rs"]
mod tests;
