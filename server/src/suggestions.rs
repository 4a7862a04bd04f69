// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Advisory suggestions derived from the current tickets, properties and
//! vehicles. Each rule runs on its own; nothing is merged or suppressed, so a
//! property or a vehicle can collect several suggestions at once.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use common::{Priority, Property, Suggestion, SuggestionKind, Ticket, TicketStatus, Vehicle, VehicleStatus};

/// Open tickets on one property at or above which a structural fix is suggested.
const RECURRING_FAULT_THRESHOLD: usize = 2;
const RECURRING_FAULT_COST: f64 = 250.0;
/// Contracts ending within this many days (exclusive) are flagged.
const CONTRACT_WINDOW_DAYS: i64 = 60;
/// Below this many days a deadline is treated as close.
const URGENT_DAYS: i64 = 30;
const INSURANCE_COST: f64 = 500.0;
const INSPECTION_COST: f64 = 80.0;

/// Snapshot the rules are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionInput<'a> {
    pub tickets: &'a [Ticket],
    pub properties: &'a [Property],
    pub vehicles: &'a [Vehicle],
}

type Rule = fn(&SuggestionInput<'_>, NaiveDate) -> Vec<Suggestion>;

const RULES: &[Rule] = &[
    recurring_faults,
    contract_expiry,
    vehicle_insurance,
    vehicle_inspection,
];

/// Runs every rule in order and concatenates what they produce.
pub fn suggest(input: &SuggestionInput<'_>, today: NaiveDate) -> Vec<Suggestion> {
    RULES.iter().flat_map(|rule| rule(input, today)).collect()
}

fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

fn vehicle_label(vehicle: &Vehicle) -> String {
    format!("{} {}", vehicle.modello, vehicle.targa)
}

fn recurring_faults(input: &SuggestionInput<'_>, _today: NaiveDate) -> Vec<Suggestion> {
    let mut open_per_property: BTreeMap<i64, (usize, Option<&str>)> = BTreeMap::new();
    for ticket in input
        .tickets
        .iter()
        .filter(|ticket| ticket.stato != TicketStatus::Risolto)
    {
        let entry = open_per_property
            .entry(ticket.property_id)
            .or_insert((0, None));
        entry.0 += 1;
        if entry.1.is_none() {
            entry.1 = ticket.property_name.as_deref();
        }
    }

    open_per_property
        .into_iter()
        .filter(|(_, (count, _))| *count >= RECURRING_FAULT_THRESHOLD)
        .map(|(property_id, (count, ticket_name))| {
            let name = ticket_name
                .map(str::to_string)
                .or_else(|| {
                    input
                        .properties
                        .iter()
                        .find(|property| property.id == property_id)
                        .map(|property| property.nome.clone())
                })
                .unwrap_or_else(|| format!("Immobile #{property_id}"));

            Suggestion {
                id: format!("guasti-{property_id}"),
                title: "Guasti ricorrenti".to_string(),
                description: format!(
                    "{name} ha {count} ticket aperti: valutare un intervento strutturale."
                ),
                priority: Priority::Alta,
                kind: SuggestionKind::Manutenzione,
                property_name: Some(name),
                estimated_cost: Some(RECURRING_FAULT_COST),
            }
        })
        .collect()
}

fn contract_expiry(input: &SuggestionInput<'_>, today: NaiveDate) -> Vec<Suggestion> {
    input
        .properties
        .iter()
        .filter_map(|property| {
            let end = property.data_fine_contratto?;
            let days = days_until(end, today);
            if days <= 0 || days >= CONTRACT_WINDOW_DAYS {
                return None;
            }

            Some(Suggestion {
                id: format!("contratto-{}", property.id),
                title: "Contratto in scadenza".to_string(),
                description: format!(
                    "Il contratto di {} scade tra {days} giorni ({end}): avviare il rinnovo.",
                    property.nome
                ),
                priority: if days < URGENT_DAYS {
                    Priority::Alta
                } else {
                    Priority::Media
                },
                kind: SuggestionKind::Contratto,
                property_name: Some(property.nome.clone()),
                estimated_cost: None,
            })
        })
        .collect()
}

fn vehicle_insurance(input: &SuggestionInput<'_>, today: NaiveDate) -> Vec<Suggestion> {
    input
        .vehicles
        .iter()
        .filter(|vehicle| vehicle.stato == VehicleStatus::Attivo)
        .filter_map(|vehicle| {
            let due = vehicle.scadenza_assicurazione?;
            let days = days_until(due, today);
            if days >= URGENT_DAYS {
                return None;
            }

            let (title, description) = if days <= 0 {
                (
                    "Assicurazione scaduta",
                    format!(
                        "L'assicurazione di {} è scaduta il {due}: il veicolo non può circolare.",
                        vehicle.targa
                    ),
                )
            } else {
                (
                    "Assicurazione in scadenza",
                    format!(
                        "L'assicurazione di {} scade tra {days} giorni ({due}).",
                        vehicle.targa
                    ),
                )
            };

            Some(Suggestion {
                id: format!("assicurazione-{}", vehicle.id),
                title: title.to_string(),
                description,
                priority: Priority::Alta,
                kind: SuggestionKind::Assicurazione,
                property_name: Some(vehicle_label(vehicle)),
                estimated_cost: Some(INSURANCE_COST),
            })
        })
        .collect()
}

fn vehicle_inspection(input: &SuggestionInput<'_>, today: NaiveDate) -> Vec<Suggestion> {
    input
        .vehicles
        .iter()
        .filter(|vehicle| vehicle.stato == VehicleStatus::Attivo)
        .filter_map(|vehicle| {
            let due = vehicle.scadenza_revisione?;
            if days_until(due, today) >= URGENT_DAYS {
                return None;
            }

            Some(Suggestion {
                id: format!("revisione-{}", vehicle.id),
                title: "Revisione in scadenza".to_string(),
                description: format!("Prenotare la revisione di {} (scadenza {due}).", vehicle.targa),
                priority: Priority::Media,
                kind: SuggestionKind::Revisione,
                property_name: Some(vehicle_label(vehicle)),
                estimated_cost: Some(INSPECTION_COST),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn ticket(id: i64, property_id: i64, name: &str, stato: TicketStatus) -> Ticket {
        Ticket {
            id,
            property_id,
            property_name: Some(name.to_string()),
            titolo: "Guasto".to_string(),
            descrizione: String::new(),
            priorita: Priority::Media,
            stato,
            scadenza: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    fn property(id: i64, days_to_end: Option<i64>) -> Property {
        Property {
            id,
            nome: format!("Immobile {id}"),
            indirizzo: "Milano".to_string(),
            data_fine_contratto: days_to_end.map(|days| today() + Duration::days(days)),
        }
    }

    fn vehicle(insurance_in: Option<i64>, inspection_in: Option<i64>) -> Vehicle {
        Vehicle {
            id: 9,
            targa: "AB123CD".to_string(),
            modello: "Fiat Panda".to_string(),
            stato: VehicleStatus::Attivo,
            scadenza_revisione: inspection_in.map(|days| today() + Duration::days(days)),
            scadenza_assicurazione: insurance_in.map(|days| today() + Duration::days(days)),
        }
    }

    fn run(tickets: &[Ticket], properties: &[Property], vehicles: &[Vehicle]) -> Vec<Suggestion> {
        suggest(
            &SuggestionInput {
                tickets,
                properties,
                vehicles,
            },
            today(),
        )
    }

    #[test]
    fn test_recurring_fault_counts_only_open_tickets() {
        let tickets = vec![
            ticket(1, 1, "Via Roma 1", TicketStatus::Aperto),
            ticket(2, 1, "Via Roma 1", TicketStatus::InCorso),
            ticket(3, 1, "Via Roma 1", TicketStatus::Risolto),
            ticket(4, 2, "Corso Italia 5", TicketStatus::Aperto),
        ];

        let suggestions = run(&tickets, &[], &[]);
        assert_eq!(suggestions.len(), 1);

        let suggestion = &suggestions[0];
        assert_eq!(suggestion.priority, Priority::Alta);
        assert_eq!(suggestion.estimated_cost, Some(250.0));
        assert_eq!(suggestion.property_name.as_deref(), Some("Via Roma 1"));
        assert!(suggestion.description.contains("Via Roma 1"));
        assert!(suggestion.description.contains(" 2 ticket aperti"));
    }

    #[test]
    fn test_contract_expiry_windows() {
        let properties = vec![
            property(1, Some(45)),
            property(2, Some(20)),
            property(3, Some(65)),
            property(4, Some(-3)),
            property(5, Some(0)),
            property(6, Some(60)),
            property(7, Some(59)),
            property(8, None),
        ];

        let suggestions = run(&[], &properties, &[]);
        let found: Vec<(&str, Priority)> = suggestions
            .iter()
            .map(|s| (s.id.as_str(), s.priority))
            .collect();
        assert_eq!(
            found,
            vec![
                ("contratto-1", Priority::Media),
                ("contratto-2", Priority::Alta),
                ("contratto-7", Priority::Media),
            ]
        );
    }

    #[test]
    fn test_insurance_boundaries() {
        assert!(run(&[], &[], &[vehicle(Some(30), None)]).is_empty());

        let upcoming = run(&[], &[], &[vehicle(Some(29), None)]);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "Assicurazione in scadenza");
        assert_eq!(upcoming[0].priority, Priority::Alta);
        assert_eq!(upcoming[0].estimated_cost, Some(500.0));

        let due_today = run(&[], &[], &[vehicle(Some(0), None)]);
        assert_eq!(due_today.len(), 1);
        assert_eq!(due_today[0].title, "Assicurazione scaduta");

        let expired = run(&[], &[], &[vehicle(Some(-12), None)]);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].title, "Assicurazione scaduta");
    }

    #[test]
    fn test_inspection_rule() {
        assert!(run(&[], &[], &[vehicle(None, Some(30))]).is_empty());

        let suggestions = run(&[], &[], &[vehicle(None, Some(-5))]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, SuggestionKind::Revisione);
        assert_eq!(suggestions[0].priority, Priority::Media);
        assert_eq!(suggestions[0].estimated_cost, Some(80.0));
    }

    #[test]
    fn test_vehicle_can_collect_both_suggestions() {
        let suggestions = run(&[], &[], &[vehicle(Some(10), Some(10))]);
        let kinds: Vec<SuggestionKind> = suggestions.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SuggestionKind::Assicurazione, SuggestionKind::Revisione]
        );
    }

    #[test]
    fn test_retired_vehicle_is_ignored() {
        let mut retired = vehicle(Some(-1), Some(-1));
        retired.stato = VehicleStatus::Dismesso;
        assert!(run(&[], &[], &[retired]).is_empty());
    }
}
