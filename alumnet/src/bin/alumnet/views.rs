use alumnet::{Community, Entity, Event, Job, Message, User};
use comfy_table::{Attribute, Cell, Table};
use serde::Serialize;

use crate::output::{GlobalOptions, TableDisplay, add_table_header, create_table};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// How a record kind is laid out in tables.
pub trait RecordView: Entity {
    /// Column headers for list output; the first column is always the id.
    const COLUMNS: &'static [&'static str];

    fn row(&self) -> Vec<String>;

    fn details(&self) -> Vec<(&'static str, String)>;

    fn summary(&self) -> String;
}

/// Several records, rendered one per row.
#[derive(Serialize)]
#[serde(transparent)]
pub struct RecordList<T>(pub Vec<T>);

/// One record, rendered as field/value pairs.
#[derive(Serialize)]
#[serde(transparent)]
pub struct RecordDetail<T>(pub T);

impl<T: RecordView> TableDisplay for RecordList<T> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        if self.0.is_empty() {
            table.add_row(vec![Cell::new(format!("No {} records found", T::LABEL))]);
            return table;
        }
        add_table_header(options, &mut table, T::COLUMNS);
        for record in &self.0 {
            table.add_row(record.row());
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0.iter().map(RecordView::summary).collect::<Vec<_>>().join("\n")
    }
}

impl<T: RecordView> TableDisplay for RecordDetail<T> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        for (field, value) in self.0.details() {
            table.add_row(vec![Cell::new(field).add_attribute(Attribute::Bold), Cell::new(value)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0.summary()
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn list(values: &[String]) -> String {
    values.join(", ")
}

impl RecordView for User {
    const COLUMNS: &'static [&'static str] = &["ID", "Name", "Email", "Role", "Company", "Class", "Admin"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.email.clone(),
            opt(&self.role),
            opt(&self.company),
            self.graduation_year.map(|year| year.to_string()).unwrap_or_default(),
            if self.is_admin { "yes".into() } else { String::new() },
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("Name", self.name.clone()),
            ("Email", self.email.clone()),
            ("Role", opt(&self.role)),
            ("Company", opt(&self.company)),
            ("Location", opt(&self.location)),
            ("Graduation year", self.graduation_year.map(|y| y.to_string()).unwrap_or_default()),
            ("Department", opt(&self.department)),
            ("Skills", list(&self.skills)),
            ("Bio", opt(&self.bio)),
            ("Avatar", opt(&self.avatar)),
            ("Admin", self.is_admin.to_string()),
            ("Created", self.created_at.format(DATE_FORMAT).to_string()),
        ]
    }

    fn summary(&self) -> String {
        format!("{} {} <{}>", self.id, self.name, self.email)
    }
}

impl RecordView for Event {
    const COLUMNS: &'static [&'static str] = &["ID", "Title", "Date", "Location", "Attendees"];

    fn row(&self) -> Vec<String> {
        let attendees = match self.max_attendees {
            Some(max) => format!("{}/{max}", self.attendee_count),
            None => self.attendee_count.to_string(),
        };
        let location = if self.is_online == Some(true) {
            "online".to_string()
        } else {
            opt(&self.location)
        };
        vec![
            self.id.clone(),
            self.title.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            location,
            attendees,
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("Title", self.title.clone()),
            ("Date", self.date.format(DATE_FORMAT).to_string()),
            ("Start", opt(&self.start_time)),
            ("End", opt(&self.end_time)),
            ("Location", opt(&self.location)),
            ("Online", self.is_online.map(|o| o.to_string()).unwrap_or_default()),
            ("Organizer", opt(&self.organizer)),
            ("Attendee count", self.attendee_count.to_string()),
            ("Max attendees", self.max_attendees.map(|m| m.to_string()).unwrap_or_default()),
            ("Attendees", list(&self.attendees)),
            ("Description", opt(&self.description)),
            ("Created", self.created_at.format(DATE_FORMAT).to_string()),
        ]
    }

    fn summary(&self) -> String {
        format!("{} {} @ {}", self.id, self.title, self.date.format(DATE_FORMAT))
    }
}

impl RecordView for Community {
    const COLUMNS: &'static [&'static str] = &["ID", "Name", "Members", "Description"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.members.to_string(),
            opt(&self.description),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("Name", self.name.clone()),
            ("Description", opt(&self.description)),
            ("Image", opt(&self.image)),
            ("Members", self.members.to_string()),
            ("Member ids", list(&self.members_list)),
            ("Created", self.created_at.format(DATE_FORMAT).to_string()),
        ]
    }

    fn summary(&self) -> String {
        format!("{} {} ({} members)", self.id, self.name, self.members)
    }
}

impl RecordView for Message {
    const COLUMNS: &'static [&'static str] = &["ID", "From", "To", "Subject", "Date", "Status"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.sender_name.clone().unwrap_or_else(|| self.sender.clone()),
            self.recipient.clone(),
            opt(&self.subject),
            self.date.format(DATE_FORMAT).to_string(),
            self.status.to_string(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("Sender", self.sender.clone()),
            ("Sender name", opt(&self.sender_name)),
            ("Recipient", self.recipient.clone()),
            ("Subject", opt(&self.subject)),
            ("Message", opt(&self.body)),
            ("Date", self.date.format(DATE_FORMAT).to_string()),
            ("Status", self.status.to_string()),
        ]
    }

    fn summary(&self) -> String {
        format!("{} [{}] {} -> {}", self.id, self.status, self.sender, self.recipient)
    }
}

impl RecordView for Job {
    const COLUMNS: &'static [&'static str] = &["ID", "Title", "Company", "Type", "Location", "Status", "Applications"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.company.clone(),
            opt(&self.job_type),
            opt(&self.location),
            self.status.to_string(),
            self.applications.to_string(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("Title", self.title.clone()),
            ("Company", self.company.clone()),
            ("Type", opt(&self.job_type)),
            ("Location", opt(&self.location)),
            ("Salary", opt(&self.salary)),
            ("Requirements", list(&self.requirements)),
            ("Responsibilities", list(&self.responsibilities)),
            ("Posted by", opt(&self.posted_by)),
            ("Posted", self.posted_date.format(DATE_FORMAT).to_string()),
            ("Applications", self.applications.to_string()),
            ("Status", self.status.to_string()),
            ("Apply URL", opt(&self.apply_url)),
            ("Contact", opt(&self.contact_email)),
        ]
    }

    fn summary(&self) -> String {
        format!("{} {} at {} [{}]", self.id, self.title, self.company, self.status)
    }
}
