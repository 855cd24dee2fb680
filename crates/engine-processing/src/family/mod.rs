use crate::transform::Transformed;
use model::records::{SourceRecord, TargetRecord, key::NaturalKey};

pub mod resume;
pub mod user;

pub use resume::ResumeFamily;
pub use user::UserFamily;

/// One kind of record migrated by a pipeline instance.
///
/// The orchestrator, filter and writer are generic over this trait; a family
/// only contributes what differs between record kinds.
pub trait RecordFamily: Send + Sync + 'static {
    type Source: SourceRecord;
    type Target: TargetRecord;

    /// Stable name used for state file names and log fields.
    fn name(&self) -> &'static str;

    /// Legacy id of the record this row depends on, for families that run
    /// after another family.
    fn dependency_id<'a>(&self, _record: &'a Self::Source) -> Option<&'a str> {
        None
    }

    /// Natural keys of the target row this source row would become.
    /// `owner` is the dependency's new id when the family has a dependency.
    fn natural_keys(&self, record: &Self::Source, owner: Option<&str>) -> Vec<NaturalKey>;

    /// Whether a collision on `key` means the existing target row is the
    /// same record, so `legacy id -> existing id` may be recorded.
    fn adopts_on(&self, _key: &NaturalKey) -> bool {
        false
    }

    fn transform(
        &self,
        record: &Self::Source,
        new_id: String,
        owner: Option<&str>,
    ) -> Transformed<Self::Target>;
}
