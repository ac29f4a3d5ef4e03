//! Waveguide type selection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dialog::{DialogOutcome, ModalHost};
use crate::error::{parse_field, ConfigError};

const DEFAULT_WIDTH: f64 = 0.5;
const DEFAULT_RADIUS: f64 = 5.0;

/// One layer of a waveguide cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveguideLayer {
    pub layer: String,
    pub width: f64,
    pub offset: f64,
}

/// Members of a compound waveguide, by waveguide type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundWaveguide {
    #[serde(default)]
    pub singlemode: Option<String>,
    #[serde(default)]
    pub multimode: Option<String>,
}

/// A waveguide type offered by a technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveguideType {
    pub name: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub wg_width: Option<f64>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub adiabatic: bool,
    #[serde(default)]
    pub bezier: Option<f64>,
    #[serde(default, rename = "component")]
    pub components: Vec<WaveguideLayer>,
    #[serde(default)]
    pub compound_waveguide: Option<CompoundWaveguide>,
    #[serde(default, rename = "CML")]
    pub cml: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl WaveguideType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: None,
            wg_width: None,
            radius: None,
            adiabatic: false,
            bezier: None,
            components: Vec::new(),
            compound_waveguide: None,
            cml: None,
            model: None,
        }
    }
}

/// Waveguide types per technology name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveguideLibrary {
    technologies: HashMap<String, Vec<WaveguideType>>,
}

impl WaveguideLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"<technology>": [<waveguide type>, ...], ...}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, technology: &str, waveguides: Vec<WaveguideType>) {
        self.technologies.insert(technology.to_string(), waveguides);
    }

    pub fn waveguides(&self, technology: &str) -> &[WaveguideType] {
        self.technologies
            .get(technology)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Editable state of the waveguide form. Numeric fields hold the text the
/// user sees and are parsed when parameters are read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveguideForm {
    pub options: Vec<String>,
    pub configuration: String,
    pub width: String,
    pub radius: String,
    pub adiabatic: bool,
    pub bezier: String,
    pub bezier_enabled: bool,
}

/// Waveguide settings chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveguideParams {
    pub radius: f64,
    pub width: f64,
    pub adiabatic: bool,
    pub bezier: f64,
    pub waveguide_type: String,
    pub wgs: Vec<WaveguideLayer>,
    #[serde(rename = "CML")]
    pub cml: String,
    pub model: String,
}

pub struct WaveguideDialog {
    library: WaveguideLibrary,
    waveguides: Vec<WaveguideType>,
    form: WaveguideForm,
    loaded_technology: Option<String>,
}

impl WaveguideDialog {
    pub fn new(library: WaveguideLibrary) -> Self {
        Self {
            library,
            waveguides: Vec::new(),
            form: WaveguideForm::default(),
            loaded_technology: None,
        }
    }

    pub fn form(&self) -> &WaveguideForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut WaveguideForm {
        &mut self.form
    }

    /// Load the waveguide types of `technology` and select the first one.
    pub fn update(&mut self, technology: &str) -> Result<(), ConfigError> {
        self.waveguides = self.library.waveguides(technology).to_vec();
        self.form.options = self.waveguides.iter().map(|w| w.name.clone()).collect();
        self.form.configuration.clear();
        if self.waveguides.is_empty() {
            return Err(ConfigError::NoWaveguides(technology.to_string()));
        }
        log::info!(
            "Loaded {} waveguide types for technology '{technology}'",
            self.waveguides.len()
        );
        self.select_configuration("")
    }

    /// Select a waveguide type and fill the form from it. An empty name
    /// selects the first type. Compound waveguides show their singlemode
    /// member.
    pub fn select_configuration(&mut self, name: &str) -> Result<(), ConfigError> {
        let selected = match name {
            "" => self.waveguides.first(),
            _ => self.find(name),
        }
        .ok_or_else(|| ConfigError::UnknownWaveguide(name.to_string()))?;

        let shown = match &selected.compound_waveguide {
            Some(compound) => {
                let singlemode = compound
                    .singlemode
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingSinglemode(selected.name.clone()))?;
                self.find(singlemode)
                    .ok_or_else(|| ConfigError::UnknownWaveguide(singlemode.to_string()))?
            }
            None => selected,
        };

        let configuration = selected.name.clone();
        let width = shown.width.or(shown.wg_width).unwrap_or(DEFAULT_WIDTH);
        let radius = shown.radius.unwrap_or(DEFAULT_RADIUS);
        let adiabatic = shown.adiabatic;
        let bezier = match (adiabatic, shown.bezier) {
            (true, Some(b)) => b.to_string(),
            _ => String::new(),
        };
        log::debug!("Selected waveguide '{configuration}' (shown as '{}')", shown.name);

        self.form.configuration = configuration;
        self.form.width = width.to_string();
        self.form.radius = radius.to_string();
        self.form.bezier = bezier;
        self.set_adiabatic(adiabatic);
        Ok(())
    }

    /// The bezier field is only editable for adiabatic bends.
    pub fn set_adiabatic(&mut self, adiabatic: bool) {
        self.form.adiabatic = adiabatic;
        self.form.bezier_enabled = adiabatic;
    }

    /// Ask for waveguide parameters for `technology`.
    ///
    /// The dialog is shown when the technology changed since the last
    /// accepted call, or when `show` is set. Returns `None` if the user
    /// cancels or no waveguide type is selected.
    pub fn get_parameters<H: ModalHost<Self> + ?Sized>(
        &mut self,
        technology: &str,
        show: bool,
        host: &mut H,
    ) -> Result<Option<WaveguideParams>, ConfigError> {
        let outcome = if self.loaded_technology.as_deref() != Some(technology) {
            self.update(technology)?;
            host.exec(self)
        } else if show {
            host.exec(self)
        } else {
            DialogOutcome::Accepted
        };

        if outcome == DialogOutcome::Cancelled {
            self.loaded_technology = None;
            return Ok(None);
        }
        self.loaded_technology = Some(technology.to_string());

        let radius = parse_field("radius", &self.form.radius)?;
        let width = parse_field("width", &self.form.width)?;
        let bezier = if self.form.bezier.trim().is_empty() {
            0.0
        } else {
            parse_field("bezier", &self.form.bezier)?
        };

        if self.form.configuration.is_empty() {
            return Ok(None);
        }
        let waveguide = self
            .find(&self.form.configuration)
            .ok_or_else(|| ConfigError::UnknownWaveguide(self.form.configuration.clone()))?;

        Ok(Some(WaveguideParams {
            radius,
            width,
            adiabatic: self.form.adiabatic,
            bezier,
            waveguide_type: waveguide.name.clone(),
            wgs: waveguide.components.clone(),
            cml: waveguide.cml.clone().unwrap_or_default(),
            model: waveguide.model.clone().unwrap_or_default(),
        }))
    }

    fn find(&self, name: &str) -> Option<&WaveguideType> {
        self.waveguides.iter().find(|w| w.name == name)
    }
}
