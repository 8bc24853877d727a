/*!
Voter import and turf management for field campaigns.

`campaign_core` holds the parts of a campaign client that do not need the network:
- reading an arbitrary voter CSV, guessing which column holds which field, and
  rebuilding a clean payload for the import endpoint ([import], [builder::ImportSession]);
- exporting voter lists back to CSV or JSON ([export]);
- drawing turfs, deciding which voters are inside them, and keeping track of
  assignments and canvassing results ([geofence], [turf]);
- the signed-in session and user notifications ([session], [notify]).

See the [manual] for the accepted file formats and the rules applied during import.
*/

mod config;
mod error;

pub mod builder;
pub mod csv_text;
pub mod export;
pub mod geofence;
pub mod import;
pub mod manual;
pub mod notify;
pub mod session;
pub mod turf;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::geofence::{Boundary, Containment, GeoPoint, RayCasting};
pub use crate::import::{ColumnMapping, ImportPayload};
pub use crate::turf::{
    CanvassResult, CanvassingInteraction, NewTurf, Turf, TurfAssignment, TurfId, TurfLedger,
    TurfProgress, VolunteerId, VolunteerTurfProgress, VoterId,
};
