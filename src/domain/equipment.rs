// Equipment domain model
use serde::{Deserialize, Serialize};

/// Number of recent samples kept per measured quantity.
pub const WINDOW_LEN: usize = 20;

/// The three measured quantities of a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    Flowrate,
    Pressure,
    Temperature,
}

impl Measurement {
    pub const ALL: [Measurement; 3] = [
        Measurement::Flowrate,
        Measurement::Pressure,
        Measurement::Temperature,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Measurement::Flowrate => "flowrate",
            Measurement::Pressure => "pressure",
            Measurement::Temperature => "temperature",
        }
    }
}

/// Fixed-capacity ring of the most recent samples, oldest first when read.
///
/// Writes overwrite the oldest slot once full, so a window never reallocates.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    slots: [f64; WINDOW_LEN],
    head: usize,
    len: usize,
}

impl RollingWindow {
    pub fn new() -> Self {
        Self {
            slots: [0.0; WINDOW_LEN],
            head: 0,
            len: 0,
        }
    }

    pub fn seeded(sample: f64) -> Self {
        let mut window = Self::new();
        window.push(sample);
        window
    }

    pub fn push(&mut self, sample: f64) {
        let tail = (self.head + self.len) % WINDOW_LEN;
        self.slots[tail] = sample;
        if self.len < WINDOW_LEN {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % WINDOW_LEN;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).map(move |i| self.slots[(self.head + i) % WINDOW_LEN])
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let mut samples = Vec::with_capacity(self.len());
        samples.extend(self.iter());
        samples
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<f64>> for RollingWindow {
    // Longer inputs keep only their most recent samples
    fn from(samples: Vec<f64>) -> Self {
        let mut window = Self::new();
        for sample in samples {
            window.push(sample);
        }
        window
    }
}

// Equal when the logical sample sequences match, wherever the ring head sits.
impl PartialEq for RollingWindow {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Serialize for RollingWindow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RollingWindow {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<f64>::deserialize(deserializer).map(RollingWindow::from)
    }
}

/// Recent samples for each measured quantity of one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementHistory {
    pub flow: RollingWindow,
    pub press: RollingWindow,
    pub temp: RollingWindow,
}

impl MeasurementHistory {
    pub fn seeded(record: &EquipmentRecord) -> Self {
        Self {
            flow: RollingWindow::seeded(record.flowrate),
            press: RollingWindow::seeded(record.pressure),
            temp: RollingWindow::seeded(record.temperature),
        }
    }

    pub fn window_mut(&mut self, measurement: Measurement) -> &mut RollingWindow {
        match measurement {
            Measurement::Flowrate => &mut self.flow,
            Measurement::Pressure => &mut self.press,
            Measurement::Temperature => &mut self.temp,
        }
    }
}

/// One piece of plant equipment and its latest readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "Equipment Name", alias = "Equipment")]
    pub name: String,
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
    #[serde(alias = "Flowrate", default)]
    pub flowrate: f64,
    #[serde(alias = "Pressure", default)]
    pub pressure: f64,
    #[serde(alias = "Temperature", default)]
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<MeasurementHistory>,
}

impl EquipmentRecord {
    pub fn new(
        id: String,
        name: String,
        kind: String,
        flowrate: f64,
        pressure: f64,
        temperature: f64,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            flowrate,
            pressure,
            temperature,
            history: None,
        }
    }

    pub fn value(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.flowrate,
            Measurement::Pressure => self.pressure,
            Measurement::Temperature => self.temperature,
        }
    }

    pub fn set_value(&mut self, measurement: Measurement, value: f64) {
        match measurement {
            Measurement::Flowrate => self.flowrate = value,
            Measurement::Pressure => self.pressure = value,
            Measurement::Temperature => self.temperature = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_keeps_most_recent_samples() {
        let mut window = RollingWindow::new();
        for i in 0..25 {
            window.push(i as f64);
        }

        assert_eq!(window.len(), WINDOW_LEN);
        assert_eq!(window.iter().next(), Some(5.0));
        assert_eq!(window.iter().last(), Some(24.0));
        assert_eq!(window.to_vec(), (5..25).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_from_long_vec_truncates_front() {
        let window = RollingWindow::from((0..30).map(|i| i as f64).collect::<Vec<_>>());
        assert_eq!(window.len(), WINDOW_LEN);
        assert_eq!(window.to_vec()[0], 10.0);
    }

    #[test]
    fn test_wrapped_window_equals_after_json_round_trip() {
        let mut window = RollingWindow::new();
        for i in 0..25 {
            window.push(i as f64);
        }

        let json = serde_json::to_string(&window).unwrap();
        let back: RollingWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_vec(), window.to_vec());
        assert_eq!(back, window);

        let mut history = MeasurementHistory::default();
        history.press = window.clone();
        let json = serde_json::to_string(&history).unwrap();
        let back: MeasurementHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);

        let mut shifted = window.clone();
        shifted.push(25.0);
        assert_ne!(shifted, window);
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = EquipmentRecord::new(
            "eq-1-0".to_string(),
            "Pump A".to_string(),
            "Pump".to_string(),
            450.5,
            12.4,
            85.0,
        );
        record.history = Some(MeasurementHistory::seeded(&record));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Pump");
        assert_eq!(json["flowrate"], 450.5);
        assert_eq!(json["history"]["press"], serde_json::json!([12.4]));

        let back: EquipmentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_accepts_tabular_column_names() {
        let json = r#"{"Equipment Name":"Valve V-01","Type":"Valve","Flowrate":320.4,"Pressure":15.8,"Temperature":40.0}"#;
        let record: EquipmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Valve V-01");
        assert_eq!(record.kind, "Valve");
        assert_eq!(record.pressure, 15.8);
        assert!(record.id.is_empty());
    }
}
