pub mod gist;

pub use gist::{
    CreateGistRequest, EditGistRequest, GistContentExternal, GistExternal, GistFileExternal,
    GistHistoryExternal,
};
