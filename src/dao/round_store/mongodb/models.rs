use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    HoleDetailEntity, HoleRecordEntity, PlayerSlotEntity, RoundEntity, StatPromptEntity,
    TeamEntity, TransferRequestEntity,
};
use crate::scoring::format::ScoringFormat;
use crate::state::round::{Privacy, RoundStatus};

/// Round document as stored in the `rounds` collection. Top-level timestamps
/// are converted to BSON datetimes so they stay queryable; nested entities
/// are embedded as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoundDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    status: RoundStatus,
    marker_id: Uuid,
    course_id: String,
    course_name: String,
    hole_count: u8,
    format: ScoringFormat,
    playing_order: Vec<u8>,
    hole_details: Vec<HoleDetailEntity>,
    players: Vec<PlayerSlotEntity>,
    teams: Vec<TeamEntity>,
    current_hole: u8,
    hole_data: Vec<HoleRecordEntity>,
    transfer_request: Option<TransferRequestEntity>,
    stat_prompts: StatPromptEntity,
    privacy: Privacy,
    round_type: String,
    started_at: DateTime,
    completed_at: Option<DateTime>,
    abandoned_at: Option<DateTime>,
    abandoned_by: Option<Uuid>,
}

impl From<RoundEntity> for MongoRoundDocument {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            status: value.status,
            marker_id: value.marker_id,
            course_id: value.course_id,
            course_name: value.course_name,
            hole_count: value.hole_count,
            format: value.format,
            playing_order: value.playing_order,
            hole_details: value.hole_details,
            players: value.players,
            teams: value.teams,
            current_hole: value.current_hole,
            hole_data: value.hole_data,
            transfer_request: value.transfer_request,
            stat_prompts: value.stat_prompts,
            privacy: value.privacy,
            round_type: value.round_type,
            started_at: DateTime::from_system_time(value.started_at),
            completed_at: value.completed_at.map(DateTime::from_system_time),
            abandoned_at: value.abandoned_at.map(DateTime::from_system_time),
            abandoned_by: value.abandoned_by,
        }
    }
}

impl From<MongoRoundDocument> for RoundEntity {
    fn from(value: MongoRoundDocument) -> Self {
        Self {
            id: value.id,
            status: value.status,
            marker_id: value.marker_id,
            course_id: value.course_id,
            course_name: value.course_name,
            hole_count: value.hole_count,
            format: value.format,
            playing_order: value.playing_order,
            hole_details: value.hole_details,
            players: value.players,
            teams: value.teams,
            current_hole: value.current_hole,
            hole_data: value.hole_data,
            transfer_request: value.transfer_request,
            stat_prompts: value.stat_prompts,
            privacy: value.privacy,
            round_type: value.round_type,
            started_at: value.started_at.to_system_time(),
            completed_at: value.completed_at.map(|at| at.to_system_time()),
            abandoned_at: value.abandoned_at.map(|at| at.to_system_time()),
            abandoned_by: value.abandoned_by,
        }
    }
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
