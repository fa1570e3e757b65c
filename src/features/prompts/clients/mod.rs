pub mod knowledge_base;

pub use knowledge_base::{
    CreateKnowledgeBaseRequest, HttpKnowledgeBaseClient, KnowledgeBase, KnowledgeBaseApi,
    KnowledgeBaseError, UpdateKnowledgeBaseRequest,
};
