//! Parsed representation of a netlist file.

/// Complete parsed netlist: component lines in file order.
#[derive(Debug, Clone, Default)]
pub struct NetlistAst {
    /// All component definitions, in the order they appear in the file
    pub components: Vec<ComponentDef>,
}

impl NetlistAst {
    /// Create a new empty netlist AST.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no component lines were found.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// One `SYMBOL start end value` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDef {
    /// Component kind selected by the symbol
    pub kind: ComponentKind,
    /// The symbol as written (e.g. `R`, `R12`, `Vin`)
    pub symbol: String,
    /// Start node index
    pub start: usize,
    /// End node index
    pub end: usize,
    /// Value field; meaning depends on the kind
    pub value: f64,
    /// Source line number for error reporting
    pub line: usize,
}

/// Component kinds of the netlist format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// `R`: resistor, value in ohms
    Resistor,
    /// `C`: capacitor, value in farads
    Capacitor,
    /// `L`: inductor, value in henries
    Inductor,
    /// `Vi`: voltage source driven by the audio input
    ExternalVoltageSource,
    /// `V`: ideal voltage source, value in volts
    VoltageSource,
    /// `I`: current source, value in amperes
    CurrentSource,
    /// `O`: ideal op-amp, value is the output node index
    IdealOpAmp,
    /// `D`: diode with the reference model, value ignored
    Diode,
    /// `Vo`: voltage probe, value ignored
    VoltageProbe,
}

impl ComponentKind {
    /// Resolve a component kind from its symbol.
    ///
    /// Only the leading letter matters, except for `V` where the second
    /// letter tells an audio input (`Vi…`) or a probe (`Vo…`) apart from an
    /// ideal source. Matching is case-sensitive: `r` is unknown and `VO` is
    /// an ideal source.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let mut chars = symbol.chars();
        match chars.next()? {
            'R' => Some(Self::Resistor),
            'C' => Some(Self::Capacitor),
            'L' => Some(Self::Inductor),
            'I' => Some(Self::CurrentSource),
            'O' => Some(Self::IdealOpAmp),
            'D' => Some(Self::Diode),
            'V' => match chars.next() {
                Some('i') => Some(Self::ExternalVoltageSource),
                Some('o') => Some(Self::VoltageProbe),
                _ => Some(Self::VoltageSource),
            },
            _ => None,
        }
    }

    /// Whether this kind takes a slot in the auxiliary unknown vector.
    pub fn claims_aux(&self) -> bool {
        matches!(
            self,
            Self::ExternalVoltageSource
                | Self::VoltageSource
                | Self::Capacitor
                | Self::Inductor
                | Self::IdealOpAmp
        )
    }
}
