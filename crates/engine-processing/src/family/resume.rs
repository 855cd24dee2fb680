use crate::{
    family::RecordFamily,
    transform::{
        Transformed,
        document::{DocumentConverter, LegacyDocumentConverter},
        resume::transform_resume,
    },
};
use model::records::{key::NaturalKey, legacy::LegacyResume, target::NewResume};

pub struct ResumeFamily {
    converter: Box<dyn DocumentConverter>,
}

impl Default for ResumeFamily {
    fn default() -> Self {
        Self::new(Box::new(LegacyDocumentConverter))
    }
}

impl ResumeFamily {
    pub fn new(converter: Box<dyn DocumentConverter>) -> Self {
        Self { converter }
    }
}

impl RecordFamily for ResumeFamily {
    type Source = LegacyResume;
    type Target = NewResume;

    fn name(&self) -> &'static str {
        "resumes"
    }

    fn dependency_id<'a>(&self, record: &'a LegacyResume) -> Option<&'a str> {
        Some(&record.user_id)
    }

    fn natural_keys(&self, record: &LegacyResume, owner: Option<&str>) -> Vec<NaturalKey> {
        match owner {
            Some(user_id) => vec![NaturalKey::Slug {
                slug: record.slug.clone(),
                user_id: user_id.to_string(),
            }],
            None => Vec::new(),
        }
    }

    fn transform(
        &self,
        record: &LegacyResume,
        new_id: String,
        owner: Option<&str>,
    ) -> Transformed<NewResume> {
        // The filter never lets a resume through without a resolved owner.
        let owner = owner.unwrap_or_default();
        transform_resume(record, new_id, owner, self.converter.as_ref())
    }
}
