pub mod signin;
pub mod signout;
pub mod signup;
