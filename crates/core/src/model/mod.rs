mod auth;
pub mod dictionary;
mod game;
mod ids;
mod reference;
mod user;

pub use auth::{AuthState, PersistedAuth};
pub use dictionary::{
    Example, ExampleTranslation, Pronunciation, RelationType, SearchError, SearchQuery,
    SenseDetail, Word, WordDetail, WordRelation, WordSearchResponse,
};
pub use game::{
    Answer, ConfigError, CreateSessionRequest, GameMode, GameSession, OptionLabel, Question,
    QuestionError, QuestionFilter, QuestionOption, SessionConfig, SessionConfigDraft,
    SessionStatistics, SessionWithQuestions, SubmitAnswerRequest,
};
pub use ids::{
    AnswerId, LanguageId, LevelId, OptionId, ParseIdError, QuestionId, SenseId, SessionId,
    TopicId, UserId, WordId,
};
pub use reference::{Language, Level, Topic};
pub use user::{
    Availability, LoginDraft, LoginError, LoginRequest, LoginResponse, ProfileDraft,
    ProfileError, RegisterDraft, RegisterRequest, RegisterResponse, RegistrationError,
    UpdateProfileRequest, User, UserProfile,
};
