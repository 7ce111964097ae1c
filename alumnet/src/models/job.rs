use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Draft, Entity, Patch, assign, check_email, check_present, check_reference, check_url, count, required_text};
use crate::{
    errors::{IssueCollector, StoreError, ValidationResult},
    search::IndexField,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Pending,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Active => "Active",
            JobStatus::Closed => "Closed",
            JobStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(JobStatus::Active),
            "closed" => Ok(JobStatus::Closed),
            "pending" => Ok(JobStatus::Pending),
            other => Err(StoreError::Other {
                message: format!("unknown job status {other:?} (expected Active, Closed or Pending)").into(),
            }),
        }
    }
}

/// Job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Full-time, Part-time, Contract and so on.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_by: Option<String>,
    pub posted_date: DateTime<Utc>,
    #[serde(default)]
    pub applications: u32,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl Job {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Active
    }
}

impl Entity for Job {
    const COLLECTION: &'static str = "jobs";
    const LABEL: &'static str = "job";
    const INDEXED: &'static [IndexField] = &[
        IndexField::tag("$.company", "company"),
        IndexField::tag("$.location", "location"),
        IndexField::tag("$.type", "type"),
        IndexField::tag("$.status", "status"),
        IndexField::tag("$.postedBy", "postedBy"),
        IndexField::tag("$.requirements[*]", "requirements"),
        IndexField::numeric("$.applications", "applications"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        check_present(&mut issues, "title", &self.title);
        check_present(&mut issues, "company", &self.company);
        check_reference(&mut issues, "postedBy", self.posted_by.as_deref());
        check_url(&mut issues, "applyUrl", self.apply_url.as_deref());
        check_email(&mut issues, "contactEmail", self.contact_email.as_deref());
        issues.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub salary: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    pub posted_by: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub applications: Option<i64>,
    pub status: Option<JobStatus>,
    pub apply_url: Option<String>,
    pub contact_email: Option<String>,
}

impl NewJob {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            company: Some(company.into()),
            ..Self::default()
        }
    }
}

impl Draft for NewJob {
    type Entity = Job;

    fn into_entity(self, id: String, now: DateTime<Utc>) -> ValidationResult<Job> {
        let mut issues = IssueCollector::new();
        let title = required_text(&mut issues, "title", self.title);
        let company = required_text(&mut issues, "company", self.company);
        let applications = count(&mut issues, "applications", self.applications).unwrap_or(0);
        issues.finish()?;

        Ok(Job {
            id,
            title,
            company,
            location: self.location,
            description: self.description,
            job_type: self.job_type,
            salary: self.salary,
            requirements: self.requirements,
            responsibilities: self.responsibilities,
            posted_by: self.posted_by,
            posted_date: self.posted_date.unwrap_or(now),
            applications,
            status: self.status.unwrap_or_default(),
            apply_url: self.apply_url,
            contact_email: self.contact_email,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(rename = "type", default, deserialize_with = "super::nullable")]
    pub job_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub salary: Option<Option<String>>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
    pub applications: Option<i64>,
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub apply_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub contact_email: Option<Option<String>>,
}

impl Patch for JobPatch {
    type Entity = Job;

    fn apply_to(self, job: &mut Job) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        let applications = count(&mut issues, "applications", self.applications);
        issues.finish()?;

        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(company) = self.company {
            job.company = company;
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements;
        }
        if let Some(responsibilities) = self.responsibilities {
            job.responsibilities = responsibilities;
        }
        if let Some(applications) = applications {
            job.applications = applications;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        for (slot, change) in [
            (&mut job.location, self.location),
            (&mut job.description, self.description),
            (&mut job.job_type, self.job_type),
            (&mut job.salary, self.salary),
            (&mut job.apply_url, self.apply_url),
            (&mut job.contact_email, self.contact_email),
        ] {
            assign(slot, change);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(draft: NewJob) -> Job {
        draft.into_entity("ID".into(), Utc::now()).unwrap()
    }

    #[test]
    fn defaults_are_active_with_no_applications() {
        let now = Utc::now();
        let job = NewJob::new("Backend Engineer", "Acme").into_entity("ID".into(), now).unwrap();
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.applications, 0);
        assert_eq!(job.posted_date, now);
        assert!(job.is_open());
    }

    #[test]
    fn title_and_company_are_required() {
        let err = NewJob::default().into_entity("ID".into(), Utc::now()).unwrap_err();
        assert!(err.has_field("title"));
        assert!(err.has_field("company"));
    }

    #[test]
    fn contact_fields_are_format_checked() {
        let job = build(NewJob {
            apply_url: Some("not a url".into()),
            contact_email: Some("hr-at-acme".into()),
            ..NewJob::new("Backend Engineer", "Acme")
        });
        let err = job.validate().unwrap_err();
        assert!(err.has_field("applyUrl"));
        assert!(err.has_field("contactEmail"));

        let job = build(NewJob {
            apply_url: Some("https://acme.example/careers/42".into()),
            contact_email: Some("hr@acme.example".into()),
            ..NewJob::new("Backend Engineer", "Acme")
        });
        assert!(job.validate().is_ok());
    }

    #[test]
    fn job_type_uses_type_key() {
        let draft: NewJob = serde_json::from_value(json!({
            "title": "Intern",
            "company": "Acme",
            "type": "Internship",
            "requirements": ["SQL"]
        }))
        .unwrap();
        let job = build(draft);
        assert_eq!(job.job_type.as_deref(), Some("Internship"));
        let doc = serde_json::to_value(&job).unwrap();
        assert_eq!(doc["type"], "Internship");
        assert_eq!(doc["status"], "Active");
    }

    #[test]
    fn patch_closes_posting() {
        let mut job = build(NewJob::new("Backend Engineer", "Acme"));
        JobPatch {
            status: Some(JobStatus::Closed),
            applications: Some(12),
            ..JobPatch::default()
        }
        .apply_to(&mut job)
        .unwrap();
        assert!(!job.is_open());
        assert_eq!(job.applications, 12);
        assert_eq!("pending".parse::<JobStatus>().unwrap(), JobStatus::Pending);
    }

    #[test]
    fn patch_clears_salary_and_keeps_type() {
        let mut job = build(NewJob {
            salary: Some("12 LPA".into()),
            job_type: Some("Full-time".into()),
            ..NewJob::new("Backend Engineer", "Acme")
        });
        let patch: JobPatch = serde_json::from_value(json!({ "salary": null })).unwrap();
        patch.apply_to(&mut job).unwrap();
        assert!(job.salary.is_none());
        assert_eq!(job.job_type.as_deref(), Some("Full-time"));

        JobPatch {
            job_type: Some(None),
            ..JobPatch::default()
        }
        .apply_to(&mut job)
        .unwrap();
        assert!(job.job_type.is_none());
    }
}
