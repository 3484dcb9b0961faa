pub mod sirv;
