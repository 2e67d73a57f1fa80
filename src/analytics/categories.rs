//! Static lookup tables for the packed deficiency-type bitmask and the
//! integer lifecycle states.
//!
//! The tables are versioned values passed explicitly to the decode
//! functions so callers (and tests) can pin the exact vocabulary in use.

pub const UNKNOWN_TYPE_LABEL: &str = "Unbekannt";

/// Bit flag marking an emergency ("Notfall") deficiency.
pub const EMERGENCY_BIT: u32 = 1 << 13;

/// One bit per maintenance category.
#[derive(Debug, Clone, Copy)]
pub struct DeficiencyTypeTable {
    pub version: u32,
    entries: &'static [(u32, &'static str)],
}

/// Current vocabulary of the remote store's `deficiency_types` bitmask.
pub const DEFICIENCY_TYPES_V1: DeficiencyTypeTable = DeficiencyTypeTable {
    version: 1,
    entries: &[
        (0, "Sanitaer"),
        (1, "Elektrik"),
        (2, "Heizung"),
        (3, "Geraete"),
        (4, "Schimmel"),
        (5, "Laerm"),
        (6, "Reinigung"),
        (7, "Schaedlingsbekaempfung"),
        (8, "Baustruktur"),
        (9, "Aussenbereich"),
        (10, "Einzug"),
        (11, "Allgemeine Anfrage"),
        (12, "Sonstiges"),
        (13, "Notfall"),
    ],
};

impl DeficiencyTypeTable {
    /// One label per set bit, ascending bit order. A value with no known
    /// bits decodes to the single "Unbekannt" label, never an empty list.
    pub fn decode(&self, bits: u32) -> Vec<&'static str> {
        let labels: Vec<&'static str> = self
            .entries
            .iter()
            .filter(|(bit, _)| bits & (1 << bit) != 0)
            .map(|(_, label)| *label)
            .collect();
        if labels.is_empty() {
            vec![UNKNOWN_TYPE_LABEL]
        } else {
            labels
        }
    }

    pub fn is_emergency(&self, bits: u32) -> bool {
        bits & EMERGENCY_BIT != 0
    }
}

/// German display labels for the integer lifecycle states.
#[derive(Debug, Clone, Copy)]
pub struct StateLabelTable {
    pub version: u32,
    entries: &'static [(i64, &'static str)],
}

pub const STATE_LABELS_V1: StateLabelTable = StateLabelTable {
    version: 1,
    entries: &[
        (0, "Gemeldet"),
        (1, "Handwerker zugewiesen"),
        (2, "Termin geplant"),
        (4, "Warten auf Antwort"),
        (6, "Zurueckgestellt"),
        (7, "An Handwerker gesendet"),
        (9, "Reparatur abgeschlossen"),
        (10, "Rechnung eingereicht"),
        (11, "Rechnung bestritten"),
        (12, "Kosten genehmigt"),
        (13, "Mieter bestaetigt"),
        (14, "Wiederoeffnet"),
        (15, "Storniert"),
        (16, "Mit Firmenhilfe abgeschlossen"),
    ],
};

impl StateLabelTable {
    pub fn label(&self, state: i64) -> String {
        self.entries
            .iter()
            .find(|(id, _)| *id == state)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| format!("Status {state}"))
    }
}

/// States counted as solved ("mit AILEAN geloest"). Cancelled (15) is
/// deliberately excluded.
pub const TERMINAL_STATES: [i64; 3] = [4, 9, 13];

/// Terminal states whose follow-up timestamp marks the closing time.
pub const CLOSING_STATES: [i64; 3] = [9, 13, 15];

/// Escalation stages of the external review workflow.
pub const FIRST_ESCALATION_STATES: [i64; 3] = [6, 9, 12];
pub const SECOND_ESCALATION_STATES: [i64; 3] = [11, 13, 14];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_bit_decodes_alone() {
        assert_eq!(DEFICIENCY_TYPES_V1.decode(8192), vec!["Notfall"]);
        assert!(DEFICIENCY_TYPES_V1.is_emergency(8192));
    }

    #[test]
    fn zero_decodes_to_unknown() {
        assert_eq!(DEFICIENCY_TYPES_V1.decode(0), vec![UNKNOWN_TYPE_LABEL]);
        assert!(!DEFICIENCY_TYPES_V1.is_emergency(0));
    }

    #[test]
    fn multiple_bits_decode_in_ascending_bit_order() {
        // 8200 = bit 3 (Geraete) + bit 13 (Notfall).
        assert_eq!(DEFICIENCY_TYPES_V1.decode(8200), vec!["Geraete", "Notfall"]);
    }

    #[test]
    fn unmapped_bits_alone_fall_back_to_unknown() {
        assert_eq!(
            DEFICIENCY_TYPES_V1.decode(1 << 20),
            vec![UNKNOWN_TYPE_LABEL]
        );
    }

    #[test]
    fn state_labels_cover_known_states_and_fall_back() {
        assert_eq!(STATE_LABELS_V1.label(9), "Reparatur abgeschlossen");
        assert_eq!(STATE_LABELS_V1.label(15), "Storniert");
        assert_eq!(STATE_LABELS_V1.label(99), "Status 99");
    }
}
