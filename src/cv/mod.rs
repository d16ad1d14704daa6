pub mod collections;
pub mod drafts;
pub mod export;
pub mod models;
pub mod repository;
pub mod snapshot;
pub mod theme;
pub mod validation;

pub use collections::CollectionPayload;
pub use drafts::DraftRegistry;
pub use export::render_print_html;
pub use models::{
    ContactMessage, CvData, CvStats, DashboardStats, Education, Experience, NewContactMessage,
    PersonalInfo, Project, SkillCategory, Technology,
};
pub use repository::CvRepository;
pub use snapshot::{CvSnapshot, clean_text};
pub use theme::{ThemePalette, default_palette, find_palette, palettes};
