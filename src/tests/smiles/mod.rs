mod parse;
mod stereo;
mod write;
