//! User-facing labels and number formatting.

use chrono::NaiveDate;
use database::{ClientStatus, InteractionType, Priority, Stage, TaskStatus};
use serde::Serialize;

/// An enum with a display label and a badge style.
pub trait Labeled: Copy + 'static {
    fn label(&self) -> &'static str;

    /// CSS class of the badge showing this value.
    fn badge_class(&self) -> &'static str;

    /// Every value, in display order.
    fn all() -> &'static [Self];

    /// Stored name, used as the form/query value.
    fn value(&self) -> &'static str;
}

impl Labeled for ClientStatus {
    fn label(&self) -> &'static str {
        match self {
            ClientStatus::Prospect => "Prospecto",
            ClientStatus::Active => "Activo",
            ClientStatus::Inactive => "Inactivo",
        }
    }

    fn badge_class(&self) -> &'static str {
        match self {
            ClientStatus::Active => "badge badge-green",
            ClientStatus::Inactive => "badge badge-red",
            ClientStatus::Prospect => "badge badge-yellow",
        }
    }

    fn all() -> &'static [Self] {
        ClientStatus::ALL
    }

    fn value(&self) -> &'static str {
        self.as_str()
    }
}

impl Labeled for Stage {
    fn label(&self) -> &'static str {
        match self {
            Stage::Prospect => "Prospecto",
            Stage::Qualified => "Calificado",
            Stage::Proposal => "Propuesta",
            Stage::Negotiation => "Negociación",
            Stage::ClosedWon => "Ganada",
            Stage::ClosedLost => "Perdida",
        }
    }

    fn badge_class(&self) -> &'static str {
        match self {
            Stage::Prospect => "badge badge-gray",
            Stage::Qualified => "badge badge-blue",
            Stage::Proposal => "badge badge-yellow",
            Stage::Negotiation => "badge badge-orange",
            Stage::ClosedWon => "badge badge-green",
            Stage::ClosedLost => "badge badge-red",
        }
    }

    fn all() -> &'static [Self] {
        Stage::ALL
    }

    fn value(&self) -> &'static str {
        self.as_str()
    }
}

impl Labeled for Priority {
    fn label(&self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Media",
            Priority::Low => "Baja",
        }
    }

    fn badge_class(&self) -> &'static str {
        match self {
            Priority::High => "badge badge-red",
            Priority::Medium => "badge badge-yellow",
            Priority::Low => "badge badge-green",
        }
    }

    fn all() -> &'static [Self] {
        Priority::ALL
    }

    fn value(&self) -> &'static str {
        self.as_str()
    }
}

impl Labeled for TaskStatus {
    fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pendiente",
            TaskStatus::InProgress => "En Progreso",
            TaskStatus::Completed => "Completada",
            TaskStatus::Cancelled => "Cancelada",
        }
    }

    fn badge_class(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "badge badge-green",
            TaskStatus::InProgress => "badge badge-blue",
            TaskStatus::Cancelled => "badge badge-red",
            TaskStatus::Pending => "badge badge-gray",
        }
    }

    fn all() -> &'static [Self] {
        TaskStatus::ALL
    }

    fn value(&self) -> &'static str {
        self.as_str()
    }
}

impl Labeled for InteractionType {
    fn label(&self) -> &'static str {
        match self {
            InteractionType::Call => "Llamada",
            InteractionType::Email => "Email",
            InteractionType::Meeting => "Reunión",
            InteractionType::Note => "Nota",
        }
    }

    fn badge_class(&self) -> &'static str {
        match self {
            InteractionType::Call => "badge badge-blue",
            InteractionType::Email => "badge badge-purple",
            InteractionType::Meeting => "badge badge-green",
            InteractionType::Note => "badge badge-gray",
        }
    }

    fn all() -> &'static [Self] {
        InteractionType::ALL
    }

    fn value(&self) -> &'static str {
        self.as_str()
    }
}

/// One `<option>` of a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Options for every value of `T`, marking `selected`.
pub fn options<T: Labeled + PartialEq>(selected: Option<T>) -> Vec<SelectOption> {
    T::all()
        .iter()
        .map(|item| SelectOption {
            value: item.value().to_string(),
            label: item.label().to_string(),
            selected: selected == Some(*item),
        })
        .collect()
}

/// Options preceded by an "all" entry with an empty value, for list filters.
pub fn filter_options<T: Labeled + PartialEq>(
    all_label: &str,
    plural_labels: Option<&[&str]>,
    selected: Option<T>,
) -> Vec<SelectOption> {
    let mut list = vec![SelectOption {
        value: String::new(),
        label: all_label.to_string(),
        selected: selected.is_none(),
    }];
    let mut rest = options(selected);
    if let Some(labels) = plural_labels {
        for (option, label) in rest.iter_mut().zip(labels) {
            option.label = label.to_string();
        }
    }
    list.extend(rest);
    list
}

/// Client status filter options ("Todos los estados", "Prospectos", ...).
pub fn client_status_filter(selected: Option<ClientStatus>) -> Vec<SelectOption> {
    filter_options(
        "Todos los estados",
        Some(&["Prospectos", "Activos", "Inactivos"]),
        selected,
    )
}

pub fn stage_filter(selected: Option<Stage>) -> Vec<SelectOption> {
    filter_options("Todas las etapas", None, selected)
}

pub fn task_status_filter(selected: Option<TaskStatus>) -> Vec<SelectOption> {
    filter_options("Todos los estados", None, selected)
}

pub fn priority_filter(selected: Option<Priority>) -> Vec<SelectOption> {
    filter_options("Todas las prioridades", None, selected)
}

/// Group the integer digits of `digits` with commas.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// US-dollar amount with cents, e.g. `$1,500.00`.
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{}${}.{}", sign, group_thousands(whole), cents)
}

/// US-dollar amount rounded to whole units, e.g. `$1,500`.
pub fn format_currency_whole(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(&format!("{:.0}", amount.abs())))
}

/// Date as `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Optional date, or an empty string.
pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}
